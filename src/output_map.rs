//! Mapping from parsed types to the file each one must produce

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::types::{ParsedType, TypeKey};

#[derive(Debug, Clone)]
struct Entry {
    ty: Arc<ParsedType>,
    output: PathBuf,
}

/// Type → output path mapping, keyed by [`TypeKey`].
///
/// Types are held through `Arc` so the caller (usually whatever parsed them)
/// keeps ownership and the generator only shares a handle. Iteration is in key
/// order, which keeps logs stable; generation does not depend on it.
#[derive(Debug, Clone, Default)]
pub struct TypeOutputMap {
    entries: BTreeMap<TypeKey, Entry>,
}

impl TypeOutputMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a type, returning the previous output path if the key was present
    pub fn insert(
        &mut self,
        ty: impl Into<Arc<ParsedType>>,
        output: impl Into<PathBuf>,
    ) -> Option<PathBuf> {
        let ty = ty.into();
        let entry = Entry {
            ty: Arc::clone(&ty),
            output: output.into(),
        };
        self.entries.insert(ty.key(), entry).map(|old| old.output)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn output_for(&self, key: &TypeKey) -> Option<&Path> {
        self.entries.get(key).map(|e| e.output.as_path())
    }

    pub fn types(&self) -> impl Iterator<Item = &ParsedType> + '_ {
        self.entries.values().map(|e| e.ty.as_ref())
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&ParsedType, &Path)> + '_ {
        self.entries
            .values()
            .map(|e| (e.ty.as_ref(), e.output.as_path()))
    }

    /// First pair of distinct types whose normalized outputs are the same file
    pub(crate) fn find_output_collision(
        &self,
        normalize: impl Fn(&Path) -> PathBuf,
    ) -> Option<(TypeKey, TypeKey, PathBuf)> {
        let mut seen: HashMap<PathBuf, &TypeKey> = HashMap::with_capacity(self.entries.len());
        for (key, entry) in &self.entries {
            let resolved = normalize(&entry.output);
            if let Some(previous) = seen.get(&resolved) {
                return Some(((*previous).clone(), key.clone(), resolved));
            }
            seen.insert(resolved, key);
        }
        None
    }
}

impl<T, P> FromIterator<(T, P)> for TypeOutputMap
where
    T: Into<Arc<ParsedType>>,
    P: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (T, P)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (ty, output) in iter {
            map.insert(ty, output);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StructureType, TypeMeta, Version};

    fn structure(name: &str) -> ParsedType {
        StructureType {
            meta: TypeMeta::new(name, Version::new(1, 0)),
            fields: vec![],
            constants: vec![],
        }
        .into()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut map = TypeOutputMap::new();
        assert!(map.is_empty());

        assert!(map.insert(structure("a.A"), "a/A.hpp").is_none());
        map.insert(structure("a.B"), "a/B.hpp");

        assert_eq!(map.len(), 2);
        let key = structure("a.A").key();
        assert!(map.contains(&key));
        assert_eq!(map.output_for(&key), Some(Path::new("a/A.hpp")));
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut map = TypeOutputMap::new();
        map.insert(structure("a.A"), "old.hpp");
        let previous = map.insert(structure("a.A"), "new.hpp");

        assert_eq!(previous, Some(PathBuf::from("old.hpp")));
        assert_eq!(map.len(), 1);
        assert_eq!(map.pairs().next().unwrap().1, Path::new("new.hpp"));
    }

    #[test]
    fn test_pairs_match_keys_with_values() {
        let map: TypeOutputMap = vec![
            (structure("x.One"), "one.hpp"),
            (structure("x.Two"), "two.hpp"),
        ]
        .into_iter()
        .collect();

        for (ty, path) in map.pairs() {
            let expected = format!("{}.hpp", ty.meta().short_name().to_lowercase());
            assert_eq!(path, Path::new(&expected));
        }
        assert_eq!(map.types().count(), 2);
    }

    #[test]
    fn test_shared_type_handles() {
        let ty = Arc::new(structure("x.Shared"));
        let mut map = TypeOutputMap::new();
        map.insert(Arc::clone(&ty), "shared.hpp");

        assert_eq!(Arc::strong_count(&ty), 2);
        drop(map);
        assert_eq!(Arc::strong_count(&ty), 1);
    }

    #[test]
    fn test_find_output_collision() {
        let map: TypeOutputMap = vec![
            (structure("x.One"), "same.hpp"),
            (structure("x.Two"), "./same.hpp"),
        ]
        .into_iter()
        .collect();

        assert!(map.find_output_collision(|p| p.to_path_buf()).is_none());

        let normalize = |p: &Path| -> PathBuf {
            p.components().filter(|c| c.as_os_str() != ".").collect()
        };
        let (first, second, path) = map.find_output_collision(normalize).unwrap();
        assert_eq!(first.full_name(), "x.One");
        assert_eq!(second.full_name(), "x.Two");
        assert_eq!(path, PathBuf::from("same.hpp"));
    }
}
