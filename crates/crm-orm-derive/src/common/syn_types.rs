//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_option_inner() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(String);
        assert!(option_inner(&ty).is_none());

        let ty: syn::Type = parse_quote!(Vec<String>);
        assert!(option_inner(&ty).is_none());
    }
}
