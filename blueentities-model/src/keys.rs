use blueentities_types::{EntityId, INDEX_SUFFIX, SEPARATOR};

/// Derives backing-store keys for records and index sets.
///
/// - record key: `[namespace:]entity:id`
/// - index key:  `[namespace:]entity:set`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCodec {
    prefix: String,
}

impl KeyCodec {
    /// Creates a codec, optionally scoping every key under a namespace.
    pub fn new(namespace: Option<&str>) -> Self {
        let prefix = match namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}{SEPARATOR}"),
            _ => String::new(),
        };
        Self { prefix }
    }

    /// Returns the namespace, if one was configured.
    pub fn namespace(&self) -> Option<&str> {
        self.prefix.strip_suffix(SEPARATOR)
    }

    /// Key of the field-hash holding one instance.
    pub fn record_key(&self, entity: &str, id: &EntityId) -> String {
        format!("{}{entity}{SEPARATOR}{id}", self.prefix)
    }

    /// Key of the ordered set indexing every instance of an entity.
    pub fn index_key(&self, entity: &str) -> String {
        format!("{}{entity}{SEPARATOR}{INDEX_SUFFIX}", self.prefix)
    }

    /// Extracts the id segment from a record key (text after the last separator).
    pub fn id_from_record_key(key: &str) -> &str {
        match key.rfind(SEPARATOR) {
            Some(pos) => &key[pos + SEPARATOR.len_utf8()..],
            None => key,
        }
    }
}
