use quote::{ToTokens, format_ident};
use syn::{Attribute, Field, FieldsNamed, Token, Type, punctuated::Punctuated};

/// 所需字段在结构体中的位置
#[derive(Clone, Copy)]
pub(crate) enum Placement {
    /// 移至最前（已存在的字段也会被移动）
    Front,
    /// 缺失时追加到末尾，已存在的字段保持原位
    Back,
}

// 提取非 derive 属性与已有 derive 列表
fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) =
                attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
            {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 合并默认与已有 derive（去重，优先保留 required）
fn merge_derives(existing: Vec<syn::Path>, required: Vec<syn::Path>) -> Attribute {
    let mut seen = std::collections::HashSet::<String>::new();
    let final_list: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();
    syn::parse_quote!(#[derive(#(#final_list),*)])
}

// 归一化 derive 的 key，避免 Debug/std::fmt::Debug 重复
fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => last.ident.to_string(),
        None => p.to_token_stream().to_string(),
    }
}

// 直接在 attrs 上应用默认派生合并
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);
    let merged = merge_derives(existing, required);
    *attrs = std::iter::once(merged).chain(retained).collect();
}

/// 确保具名字段结构体包含所需字段
/// - required: (字段名, 字段类型) 列表，按给定顺序处理
/// - placement: 见 [`Placement`]
pub(crate) fn ensure_required_fields(
    fields_named: &mut FieldsNamed,
    required: &[(&str, &Type)],
    placement: Placement,
) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    match placement {
        Placement::Front => {
            for (name, ty) in required.iter() {
                match find_field(&old_named, name) {
                    Some(existing) => new_named.push(existing.clone()),
                    None => new_named.push(new_field(name, ty)),
                }
            }
            for f in old_named.into_iter() {
                let is_required = f
                    .ident
                    .as_ref()
                    .map(|i| required.iter().any(|(n, _)| i == n))
                    .unwrap_or(false);
                if !is_required {
                    new_named.push(f);
                }
            }
        }
        Placement::Back => {
            for f in old_named.iter() {
                new_named.push(f.clone());
            }
            for (name, ty) in required.iter() {
                if find_field(&old_named, name).is_none() {
                    new_named.push(new_field(name, ty));
                }
            }
        }
    }

    fields_named.named = new_named;
}

fn find_field<'a>(named: &'a Punctuated<Field, Token![,]>, name: &str) -> Option<&'a Field> {
    named
        .iter()
        .find(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

fn new_field(name: &str, ty: &Type) -> Field {
    let ident = format_ident!("{}", name);
    syn::parse_quote! { #ident: #ty }
}
