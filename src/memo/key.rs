//! Cache key derivation for memoized calls.

use serde::Serialize;

use crate::error::FetchError;

/// Derives the cache key for a call in `namespace` with `args`.
///
/// Arguments are encoded as JSON, so a tuple keeps its order and string
/// arguments are quoted and escaped. `("a,b", "c")` and `("a", "b,c")`
/// therefore never share a key.
pub fn derive_key<A: Serialize + ?Sized>(namespace: &str, args: &A) -> Result<String, FetchError> {
    let encoded = serde_json::to_string(args)?;
    Ok(format!("{}:{}", namespace, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn test_key_includes_namespace() {
        let key = derive_key("logs", &("abc", 3)).unwrap();
        assert_eq!(key, r#"logs:["abc",3]"#);
    }

    #[test]
    fn test_argument_order_matters() {
        let a = derive_key("ns", &("x", "y")).unwrap();
        let b = derive_key("ns", &("y", "x")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_separators_inside_strings_do_not_collide() {
        let a = derive_key("ns", &("a,b", "c")).unwrap();
        let b = derive_key("ns", &("a", "b,c")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_args_same_key() {
        #[derive(Serialize)]
        struct Window {
            start: i64,
            end: i64,
        }

        let a = derive_key("ns", &("id", Window { start: 1, end: 2 })).unwrap();
        let b = derive_key("ns", &("id", Window { start: 1, end: 2 })).unwrap();
        assert_eq!(a, b);
    }
}
