use crate::utils::{Placement, apply_derives, ensure_required_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input};

/// 宏作用的目标
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntityKind {
    Entity,
    Aggregate,
}

impl EntityKind {
    fn attr_name(self) -> &'static str {
        match self {
            EntityKind::Entity => "#[entity]",
            EntityKind::Aggregate => "#[aggregate]",
        }
    }
}

/// #[entity] / #[aggregate] 宏实现
/// - 确保字段 `id: EntityIdentity` 位于最前
/// - 聚合额外确保字段 `domain_events: DomainEvents` 位于末尾（若缺失）
/// - 实现 `::ddd_domain::entity::Entity`，聚合额外实现 `HasDomainEvents`
/// - 支持参数：`debug = true|false`，默认 `true`（派生 Debug）
pub(crate) fn expand(attr: TokenStream, item: TokenStream, kind: EntityKind) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            let msg = format!("{} only on struct", kind.attr_name());
            return syn::Error::new(other.span(), msg).to_compile_error().into();
        }
    };

    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_ty: Type = syn::parse_quote! { ::ddd_domain::value_object::EntityIdentity };
    ensure_required_fields(fields_named, &[("id", &id_ty)], Placement::Front);

    if kind == EntityKind::Aggregate {
        let events_ty: Type = syn::parse_quote! { ::ddd_domain::domain_event::DomainEvents };
        ensure_required_fields(fields_named, &[("domain_events", &events_ty)], Placement::Back);
    }

    let mut required: Vec<syn::Path> = Vec::new();
    if cfg.derive_debug.unwrap_or(true) {
        required.push(syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let events_impl = (kind == EntityKind::Aggregate).then(|| {
        quote! {
            impl #impl_generics ::ddd_domain::aggregate::HasDomainEvents for #ident #ty_generics #where_clause {
                fn domain_events(&self) -> &::ddd_domain::domain_event::DomainEvents {
                    &self.domain_events
                }

                fn domain_events_mut(&mut self) -> &mut ::ddd_domain::domain_event::DomainEvents {
                    &mut self.domain_events
                }
            }
        }
    });

    let expanded = quote! {
        #st

        impl #impl_generics ::ddd_domain::entity::Entity for #ident #ty_generics #where_clause {
            fn id(&self) -> ::ddd_domain::value_object::EntityIdentity {
                self.id
            }
        }

        #events_impl
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

struct EntityAttrConfig {
    derive_debug: Option<bool>,
}

impl Parse for EntityAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut derive_debug: Option<bool> = None;

        if input.is_empty() {
            return Ok(Self { derive_debug });
        }

        let elems: Punctuated<EntityAttrElem, Token![,]> =
            Punctuated::<EntityAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems.into_iter() {
            match elem {
                EntityAttrElem::Debug(span, b) => {
                    if derive_debug.is_some() {
                        return Err(syn::Error::new(span, "duplicate key 'debug' in attribute"));
                    }
                    derive_debug = Some(b);
                }
            }
        }

        Ok(Self { derive_debug })
    }
}

enum EntityAttrElem {
    Debug(proc_macro2::Span, bool),
}

impl Parse for EntityAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key == "debug" {
            let _eq: Token![=] = input.parse()?;
            let expr: syn::Expr = input.parse()?;
            match expr {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Bool(b),
                    ..
                }) => Ok(EntityAttrElem::Debug(key.span(), b.value())),
                other => Err(syn::Error::new(
                    other.span(),
                    "expected boolean literal for 'debug'",
                )),
            }
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'debug'",
            ))
        }
    }
}
