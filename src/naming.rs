//! Identifier casing for generated source.

/// Convert a raw SQL identifier to `UpperCamel` form.
///
/// Splits on every character outside `[A-Za-z0-9]` (underscore included),
/// capitalizes each token (first letter upper, the rest lower) and joins
/// them, so `customerID` becomes `Customerid`. A result that would start
/// with a digit is prefixed with `X`.
pub fn to_upper_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for token in name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(&chars.as_str().to_ascii_lowercase());
        }
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'X');
    }
    out
}

/// Convert a raw SQL identifier to `lowerCamel` form.
pub fn to_lower_camel(name: &str) -> String {
    let upper = to_upper_camel(name);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(upper.len());
            out.push(first.to_ascii_lowercase());
            out.push_str(chars.as_str());
            out
        }
        None => upper,
    }
}

/// Escape text for a C# regular string literal.
pub fn escape_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_camel() {
        assert_eq!(to_upper_camel("order_items"), "OrderItems");
        assert_eq!(to_upper_camel("Order-Items"), "OrderItems");
        assert_eq!(to_upper_camel("  first  name "), "FirstName");
    }

    #[test]
    fn test_token_tail_is_lowercased() {
        assert_eq!(to_upper_camel("customerID"), "Customerid");
        assert_eq!(to_upper_camel("OrderID"), "Orderid");
        assert_eq!(to_upper_camel("ORDER_LINES"), "OrderLines");
        assert_eq!(to_upper_camel("CustomerId"), "Customerid");
    }

    #[test]
    fn test_lower_camel() {
        assert_eq!(to_lower_camel("Order-Items"), "orderItems");
        assert_eq!(to_lower_camel("id"), "id");
        assert_eq!(to_lower_camel("ID"), "id");
        assert_eq!(to_lower_camel("OrderID"), "orderid");
    }

    #[test]
    fn test_empty_and_separator_only() {
        assert_eq!(to_upper_camel(""), "");
        assert_eq!(to_lower_camel(""), "");
        assert_eq!(to_upper_camel("__--"), "");
    }

    #[test]
    fn test_leading_digit_is_escaped() {
        assert_eq!(to_upper_camel("2fa_codes"), "X2faCodes");
        assert_eq!(to_lower_camel("2fa_codes"), "x2faCodes");
    }

    #[test]
    fn test_non_ascii_is_a_separator() {
        assert_eq!(to_upper_camel("prix_€_ttc"), "PrixTtc");
    }

    #[test]
    fn test_escape_string_literal() {
        assert_eq!(escape_string_literal(r#"N'a"b'"#), r#"N'a\"b'"#);
        assert_eq!(escape_string_literal(r"c:\x"), r"c:\\x");
    }
}
