use crate::utils::apply_derives;
use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Expr, Ident, Item, LitStr, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input,
};

/// #[domain_event] 宏实现
/// - 支持结构体（具名/元组/单元）与枚举（任意形态的变体）
/// - 默认派生 Debug, Clone, PartialEq
/// - 生成 `::ddd_domain::domain_event::DomainEvent` 实现
/// - 事件类型名：结构体默认为类型名，枚举默认为 `Enum.Variant`
/// - 支持：`#[domain_event(event_type = "...")]`；枚举变体可用 `#[event(event_type = "...")]` 覆写
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
    ];

    let (ident, generics, event_type_body) = match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, required);
            let lit = cfg
                .event_type
                .unwrap_or_else(|| LitStr::new(&st.ident.to_string(), st.ident.span()));
            (st.ident.clone(), st.generics.clone(), quote! { #lit })
        }
        Item::Enum(en) => {
            apply_derives(&mut en.attrs, required);
            let enum_name = en.ident.to_string();

            let mut arms = Vec::with_capacity(en.variants.len());
            for v in &mut en.variants {
                let overridden = match take_variant_event_type(&mut v.attrs) {
                    Ok(lit) => lit,
                    Err(err) => return err.to_compile_error().into(),
                };
                let lit = overridden.or_else(|| cfg.event_type.clone()).unwrap_or_else(|| {
                    LitStr::new(&format!("{}.{}", enum_name, v.ident), v.ident.span())
                });
                let v_ident = &v.ident;
                arms.push(quote! { Self::#v_ident { .. } => #lit });
            }

            if arms.is_empty() {
                return syn::Error::new(en.span(), "#[domain_event] enum must have variants")
                    .to_compile_error()
                    .into();
            }
            (
                en.ident.clone(),
                en.generics.clone(),
                quote! { match self { #( #arms, )* } },
            )
        }
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on struct or enum types",
            )
            .to_compile_error()
            .into();
        }
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let out = quote! {
        #input

        impl #impl_generics ::ddd_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            fn event_type(&self) -> &'static str {
                #event_type_body
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

/// 取出变体上的 `#[event(event_type = "...")]`，其余属性保留
fn take_variant_event_type(attrs: &mut Vec<syn::Attribute>) -> Result<Option<LitStr>> {
    let mut event_type: Option<LitStr> = None;
    let mut retained = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if !attr.path().is_ident("event") {
            retained.push(attr);
            continue;
        }

        let pairs: Punctuated<EventAttrKv, Token![,]> =
            attr.parse_args_with(Punctuated::<EventAttrKv, Token![,]>::parse_terminated)?;
        for kv in pairs {
            if kv.key != "event_type" {
                return Err(syn::Error::new(kv.key.span(), "unknown key; expected 'event_type'"));
            }
            if event_type.is_some() {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "duplicate 'event_type' specified for this variant",
                ));
            }
            event_type = Some(expect_str(kv.value)?);
        }
    }

    *attrs = retained;
    Ok(event_type)
}

fn expect_str(expr: Expr) -> Result<LitStr> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) => Ok(lit),
        other => Err(syn::Error::new(
            other.span(),
            "expected string literal for 'event_type'",
        )),
    }
}

struct EventAttrKv {
    key: Ident,
    value: Expr,
}

impl Parse for EventAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Expr = input.parse()?;
        Ok(Self { key, value })
    }
}

// 类型级配置：事件类型名
struct EventAttrConfig {
    event_type: Option<LitStr>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut event_type: Option<LitStr> = None;

        if input.is_empty() {
            return Ok(Self { event_type });
        }

        let pairs: Punctuated<syn::ExprAssign, Token![,]> =
            Punctuated::<syn::ExprAssign, Token![,]>::parse_terminated(input)?;

        for assign in pairs.into_iter() {
            let key_ident = match *assign.left {
                Expr::Path(p) if p.path.segments.len() == 1 => p.path.segments[0].ident.clone(),
                other => return Err(syn::Error::new(other.span(), "invalid attribute key")),
            };
            match key_ident.to_string().as_str() {
                "event_type" => {
                    if event_type.is_some() {
                        return Err(syn::Error::new(
                            key_ident.span(),
                            "duplicate key 'event_type' in attribute",
                        ));
                    }
                    let lit: LitStr = syn::parse2(assign.right.to_token_stream())?;
                    event_type = Some(lit);
                }
                _ => {
                    return Err(syn::Error::new(
                        key_ident.span(),
                        "unknown key; expected 'event_type'",
                    ));
                }
            }
        }

        Ok(Self { event_type })
    }
}
