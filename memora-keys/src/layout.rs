//! Storage key layout.
//!
//! ```text
//! entry:     {prefix}:{namespace}:{fingerprint}
//! lock:      {prefix}:{namespace}:{fingerprint}:lock
//! namespace: {prefix}:{namespace}:*            (glob, metacharacters escaped)
//! ```
//!
//! The fingerprint never contains the separator, so a key belongs to a
//! namespace only if nothing separator-delimited follows the fingerprint.
//! Namespaces may themselves contain `:` (`batch` and `batch:v2` coexist).

use memora_core::{KEY_SEPARATOR, LOCK_SUFFIX};

/// Full storage key for one argument fingerprint.
///
/// Separators inside the fingerprint (possible with a custom key deriver)
/// become `.`.
pub fn storage_key(prefix: &str, namespace: &str, fingerprint: &str) -> String {
    let fingerprint = fingerprint.replace(KEY_SEPARATOR, ".");
    format!("{prefix}{KEY_SEPARATOR}{namespace}{KEY_SEPARATOR}{fingerprint}")
}

/// Lock key guarding a storage key.
pub fn lock_key(storage_key: &str) -> String {
    format!("{storage_key}{LOCK_SUFFIX}")
}

/// Glob pattern matching every key under a namespace.
pub fn namespace_pattern(prefix: &str, namespace: &str) -> String {
    format!(
        "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}*",
        escape_glob(prefix),
        escape_glob(namespace)
    )
}

/// Returns true if `key` is an entry of exactly this namespace.
///
/// [`namespace_pattern`] also matches lock keys and the entries of any
/// namespace that extends this one past a separator; this filters both out.
pub fn in_namespace(key: &str, prefix: &str, namespace: &str) -> bool {
    let head = format!("{prefix}{KEY_SEPARATOR}{namespace}{KEY_SEPARATOR}");
    key.strip_prefix(head.as_str())
        .is_some_and(|fingerprint| !fingerprint.is_empty() && !fingerprint.contains(KEY_SEPARATOR))
}

/// Escapes glob metacharacters (`*`, `?`, `[`, `]`, `\`).
pub fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Namespace derived from a function's type path.
///
/// `my_app::billing::quote` becomes `my_app.billing.quote`, so the namespace
/// never contains the key separator. Closures are named after their enclosing
/// function (`...::{{closure}}`), so two closures in one function share a
/// default and need an explicit namespace.
pub fn default_namespace<F: ?Sized>() -> String {
    std::any::type_name::<F>()
        .replace("::", ".")
        .replace(KEY_SEPARATOR, ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fn(_: i64) -> i64 {
        0
    }

    fn type_of<T>(_: &T) -> String {
        default_namespace::<T>()
    }

    #[test]
    fn test_storage_and_lock_keys() {
        let key = storage_key("memora", "ns", "abc");
        assert_eq!(key, "memora:ns:abc");
        assert_eq!(lock_key(&key), "memora:ns:abc:lock");
    }

    #[test]
    fn test_namespace_pattern_escapes() {
        assert_eq!(namespace_pattern("memora", "batch"), "memora:batch:*");
        assert_eq!(namespace_pattern("p*", "a?[b]"), "p\\*:a\\?\\[b\\]:*");
    }

    #[test]
    fn test_storage_key_keeps_fingerprint_separator_free() {
        assert_eq!(storage_key("memora", "ns", "user:42"), "memora:ns:user.42");
    }

    #[test]
    fn test_in_namespace_rejects_nested_namespaces_and_locks() {
        let own = storage_key("memora", "batch", "abc");
        let nested = storage_key("memora", "batch:v2", "abc");

        assert!(in_namespace(&own, "memora", "batch"));
        assert!(!in_namespace(&nested, "memora", "batch"));
        assert!(in_namespace(&nested, "memora", "batch:v2"));
        assert!(!in_namespace(&lock_key(&own), "memora", "batch"));
        assert!(!in_namespace("memora:batch:", "memora", "batch"));
        assert!(!in_namespace("other:batch:abc", "memora", "batch"));
    }

    #[test]
    fn test_in_namespace_with_separator_in_prefix() {
        let key = storage_key("app:cache", "quote", "abc");
        assert!(in_namespace(&key, "app:cache", "quote"));
        assert!(!in_namespace(&key, "app", "cache"));
    }

    #[test]
    fn test_default_namespace_from_fn_item() {
        let ns = type_of(&sample_fn);
        assert!(ns.ends_with("layout.tests.sample_fn"), "{ns}");
        assert!(!ns.contains(':'));
    }

    #[test]
    fn test_default_namespace_stable() {
        assert_eq!(type_of(&sample_fn), type_of(&sample_fn));
    }
}
