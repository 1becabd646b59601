//! Process-wide pool of shared strings
//!
//! Templates repeat the same boilerplate lines and path segments thousands of
//! times; interning keeps one allocation per distinct content.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

static POOL: Lazy<Mutex<HashSet<Arc<str>>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Shared copy of `s`
pub(crate) fn intern(s: &str) -> Arc<str> {
    let mut pool = POOL.lock();
    if let Some(existing) = pool.get(s) {
        return Arc::clone(existing);
    }
    let shared: Arc<str> = Arc::from(s);
    pool.insert(Arc::clone(&shared));
    shared
}

/// Number of distinct strings currently pooled
#[must_use]
pub fn pool_size() -> usize {
    POOL.lock().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_shares_allocation() {
        let a = intern("            \"render\":\"text\",");
        let b = intern(&String::from("            \"render\":\"text\","));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_content_is_distinct() {
        let a = intern("intern-test-left");
        let b = intern("intern-test-right");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(pool_size() >= 2);
    }
}
