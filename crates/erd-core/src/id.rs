use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for document ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Shared suffix counter for generated ids.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produce `{stem}_{n}` for the next `n` whose string has never been interned,
/// so a generated id cannot collide with one loaded from a document.
fn fresh_key(stem: &str) -> Spur {
    loop {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let candidate = format!("{stem}_{n}");
        if !INTERNER.contains(&candidate) {
            return INTERNER.get_or_intern(candidate);
        }
    }
}

/// Lower-case a display name into something safe to embed in an id.
fn slug(name: &str) -> String {
    let s: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if s.is_empty() { "x".to_string() } else { s }
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &'static str {
                INTERNER.resolve(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a table; immutable once created.
    TableId
);
interned_id!(
    /// Identifier of a column, unique within its owning table.
    ColumnId
);
interned_id!(
    /// Identifier of a foreign key.
    ForeignKeyId
);
interned_id!(
    /// Identifier of a unique constraint.
    ConstraintId
);

impl TableId {
    /// Generate a fresh id of the form `tbl_<name>_<n>`.
    pub fn generate(name: &str) -> Self {
        Self(fresh_key(&format!("tbl_{}", slug(name))))
    }
}

impl ColumnId {
    /// Generate a fresh id of the form `col_<name>_<n>`.
    pub fn generate(name: &str) -> Self {
        Self(fresh_key(&format!("col_{}", slug(name))))
    }
}

impl ForeignKeyId {
    pub fn generate() -> Self {
        Self(fresh_key("fk"))
    }
}

impl ConstraintId {
    pub fn generate() -> Self {
        Self(fresh_key("uq"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = TableId::intern("tbl_users_123");
        let b = TableId::intern("tbl_users_123");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "tbl_users_123");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ColumnId::generate("id");
        let b = ColumnId::generate("id");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("col_id_"));
    }

    #[test]
    fn generated_ids_skip_already_interned_strings() {
        // Pre-intern the next few candidates; generation must step past them.
        let n = COUNTER.load(Ordering::Relaxed);
        for i in n..n + 4 {
            TableId::intern(&format!("tbl_orders_{i}"));
        }
        let fresh = TableId::generate("orders");
        let suffix: u64 = fresh
            .as_str()
            .rsplit('_')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap();
        assert!(!(n..n + 4).contains(&suffix));
    }

    #[test]
    fn slug_replaces_non_alphanumerics() {
        let id = TableId::generate("Order Items");
        assert!(id.as_str().starts_with("tbl_order_items_"));
    }
}
