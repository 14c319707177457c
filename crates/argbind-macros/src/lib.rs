use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    ext::IdentExt, parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident, LitBool,
    LitChar, LitInt, LitStr, PathArguments, Result, Type,
};

/// Derive `argbind::Record` and `argbind::Bind` for a struct with named fields.
///
/// ```ignore
/// #[derive(Default, argbind::Args)]
/// struct Cli {
///     #[argument(index = 0)]
///     input: String,
///     #[argument(index = 1, optional)]
///     extra: Vec<String>,
///     #[option(description = "Output file", alias = "out", short = 'O')]
///     output: Option<PathBuf>,
///     #[option(description = "Show this help", autonomous)]
///     help: bool,
/// }
/// ```
///
/// The field kind follows the declared type: `bool` is a flag, `Vec`,
/// `VecDeque`, `BTreeSet` and `HashSet` (optionally inside `Option`) are
/// collections, anything else is a scalar converted through `ArgValue`.
/// Fields without `#[option]` or `#[argument]` are left at their default.
#[proc_macro_derive(Args, attributes(option, argument))]
pub fn derive_args(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_args(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `argbind::ArgValue` for a fieldless enum.
///
/// Variants become constants in SCREAMING_SNAKE_CASE (`DarkBlue` is matched
/// by `dark_blue`, `DARK_BLUE`, ...) and are listed in lower case in usage
/// text.
#[proc_macro_derive(ArgEnum)]
pub fn derive_arg_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_arg_enum(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct OptionSpec {
    description: Option<String>,
    alias: Option<String>,
    short: Option<char>,
    autonomous: bool,
}

struct ArgumentSpec {
    index: i64,
    optional: bool,
}

/// How a field's declared type consumes values.
enum Shape<'a> {
    Flag,
    Scalar { ty: &'a Type, wrapped: bool },
    Collection { elem: &'a Type, wrapped: bool },
}

const COLLECTIONS: &[&str] = &["Vec", "VecDeque", "BTreeSet", "HashSet"];

fn expand_args(input: DeriveInput) -> Result<TokenStream2> {
    let ident = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            ident.span(),
            "#[derive(Args)] only supports structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            ident.span(),
            "#[derive(Args)] requires named fields",
        ));
    };

    let mut decls = Vec::new();
    let mut arms = Vec::new();

    for field in &fields.named {
        let option = parse_option(field)?;
        let argument = parse_argument(field)?;
        if option.is_none() && argument.is_none() {
            continue;
        }

        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let name = field_ident.unraw().to_string();
        let slot = decls.len();
        let shape = classify(&field.ty);

        let kind = match &shape {
            Shape::Flag => quote! { ::argbind::FieldKind::Flag },
            Shape::Scalar { ty, .. } => quote! {
                ::argbind::FieldKind::Scalar(<#ty as ::argbind::ArgValue>::value_kind())
            },
            Shape::Collection { elem, .. } => quote! {
                ::argbind::FieldKind::Collection(<#elem as ::argbind::ArgValue>::value_kind())
            },
        };

        let mut decl = quote! { ::argbind::FieldDecl::new(#name, #kind) };
        if let Some(option) = option {
            let description = option.description.unwrap_or_default();
            let mut option_decl = quote! { ::argbind::OptionDecl::new(#description) };
            if let Some(alias) = option.alias {
                option_decl = quote! { #option_decl.alias(#alias) };
            }
            if let Some(short) = option.short {
                option_decl = quote! { #option_decl.short(#short) };
            }
            if option.autonomous {
                option_decl = quote! { #option_decl.autonomous() };
            }
            decl = quote! { #decl.option(#option_decl) };
        }
        if let Some(argument) = argument {
            let index = argument.index;
            let mut argument_decl = quote! { ::argbind::ArgumentDecl::new(#index) };
            if argument.optional {
                argument_decl = quote! { #argument_decl.optional() };
            }
            decl = quote! { #decl.argument(#argument_decl) };
        }
        decls.push(decl);

        let store = match shape {
            Shape::Flag => quote! {
                self.#field_ident = ::argbind::value::flag(slot, value)?;
            },
            Shape::Scalar { ty, wrapped: false } => quote! {
                self.#field_ident = <#ty as ::argbind::ArgValue>::from_bound(slot, value)?;
            },
            Shape::Scalar { ty, wrapped: true } => quote! {
                self.#field_ident = ::std::option::Option::Some(
                    <#ty as ::argbind::ArgValue>::from_bound(slot, value)?,
                );
            },
            Shape::Collection { elem, wrapped: false } => quote! {
                ::argbind::value::Collection::add(
                    &mut self.#field_ident,
                    <#elem as ::argbind::ArgValue>::from_bound(slot, value)?,
                );
            },
            Shape::Collection { elem, wrapped: true } => quote! {
                ::argbind::value::Collection::add(
                    self.#field_ident.get_or_insert_with(::std::default::Default::default),
                    <#elem as ::argbind::ArgValue>::from_bound(slot, value)?,
                );
            },
        };
        arms.push(quote! {
            #slot => {
                #store
                ::std::result::Result::Ok(())
            }
        });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::argbind::Record for #ident #ty_generics #where_clause {
            fn descriptors() -> ::std::vec::Vec<::argbind::FieldDecl> {
                ::std::vec![#(#decls),*]
            }
        }

        impl #impl_generics ::argbind::Bind for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn bind(
                &mut self,
                slot: &::argbind::FieldSlot,
                value: ::argbind::BoundValue<'_>,
            ) -> ::std::result::Result<(), ::argbind::BindError> {
                match slot.id() {
                    #(#arms)*
                    _ => ::std::result::Result::Err(::argbind::BindError::unknown_field(slot)),
                }
            }
        }
    })
}

fn parse_option(field: &syn::Field) -> Result<Option<OptionSpec>> {
    let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("option")) else {
        return Ok(None);
    };

    let mut spec = OptionSpec::default();
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(Some(spec));
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("description") {
            spec.description = Some(meta.value()?.parse::<LitStr>()?.value());
        } else if meta.path.is_ident("alias") {
            let alias = meta.value()?.parse::<LitStr>()?;
            if alias.value().is_empty() {
                return Err(syn::Error::new(alias.span(), "alias must not be empty"));
            }
            spec.alias = Some(alias.value());
        } else if meta.path.is_ident("short") {
            spec.short = Some(meta.value()?.parse::<LitChar>()?.value());
        } else if meta.path.is_ident("autonomous") {
            spec.autonomous = parse_flag(&meta)?;
        } else {
            return Err(meta.error("unknown option attribute"));
        }
        Ok(())
    })?;
    Ok(Some(spec))
}

fn parse_argument(field: &syn::Field) -> Result<Option<ArgumentSpec>> {
    let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("argument")) else {
        return Ok(None);
    };

    let mut index = None;
    let mut optional = false;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("index") {
            index = Some(meta.value()?.parse::<LitInt>()?.base10_parse::<i64>()?);
        } else if meta.path.is_ident("optional") {
            optional = parse_flag(&meta)?;
        } else {
            return Err(meta.error("unknown argument attribute"));
        }
        Ok(())
    })?;

    let Some(index) = index else {
        return Err(syn::Error::new_spanned(attr, "missing required `index = N`"));
    };
    Ok(Some(ArgumentSpec { index, optional }))
}

/// `name` alone means true; `name = false` is accepted too.
fn parse_flag(meta: &syn::meta::ParseNestedMeta<'_>) -> Result<bool> {
    if meta.input.peek(syn::Token![=]) {
        Ok(meta.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}

fn classify(ty: &Type) -> Shape<'_> {
    if is_bool(ty) {
        return Shape::Flag;
    }
    if let Some(inner) = generic_arg(ty, &["Option"]) {
        return match generic_arg(inner, COLLECTIONS) {
            Some(elem) => Shape::Collection {
                elem,
                wrapped: true,
            },
            None => Shape::Scalar {
                ty: inner,
                wrapped: true,
            },
        };
    }
    match generic_arg(ty, COLLECTIONS) {
        Some(elem) => Shape::Collection {
            elem,
            wrapped: false,
        },
        None => Shape::Scalar { ty, wrapped: false },
    }
}

fn is_bool(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.qself.is_none() && p.path.is_ident("bool"))
}

/// The first type argument of `ty` if its last path segment is one of `names`.
fn generic_arg<'a>(ty: &'a Type, names: &[&str]) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if !names.iter().any(|n| segment.ident == *n) {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

fn expand_arg_enum(input: DeriveInput) -> Result<TokenStream2> {
    let ident = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            ident.span(),
            "#[derive(ArgEnum)] only supports enums",
        ));
    };

    let mut constants = Vec::new();
    let mut arms = Vec::new();
    for (index, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.ident.span(),
                "#[derive(ArgEnum)] variants must not carry data",
            ));
        }
        let variant_ident = &variant.ident;
        constants.push(screaming_snake(&variant_ident.unraw()));
        arms.push(quote! { #index => ::std::result::Result::Ok(Self::#variant_ident), });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::argbind::ArgValue for #ident #ty_generics #where_clause {
            fn value_kind() -> ::argbind::ValueKind {
                let constants: &[&str] = &[#(#constants),*];
                ::argbind::ValueKind::enumeration(constants)
            }

            fn from_bound(
                slot: &::argbind::FieldSlot,
                value: ::argbind::BoundValue<'_>,
            ) -> ::std::result::Result<Self, ::argbind::BindError> {
                const CONSTANTS: &[&str] = &[#(#constants),*];
                match ::argbind::value::constant(slot, value, CONSTANTS)? {
                    #(#arms)*
                    _ => ::std::result::Result::Err(::argbind::BindError::unknown_field(slot)),
                }
            }
        }
    })
}

/// `DarkBlue` -> `DARK_BLUE`, `HTTP2` -> `HTTP2`.
fn screaming_snake(ident: &Ident) -> String {
    let name = ident.to_string();
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev != '_' && (prev.is_lowercase() || prev.is_ascii_digit() || next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}
