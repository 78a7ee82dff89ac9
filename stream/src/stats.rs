//! Stream statistics without decoding
//!
//! Used by `tessera inspect` to show what a file contains and how much of it is
//! shared.

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::record::{Document, collect_refs};

/// Object and reference counts of one document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub format: String,
    pub version: u32,
    /// Records per type name, sorted by name
    pub objects_by_type: BTreeMap<String, usize>,
    pub total_objects: usize,
    /// Back-references across all payloads
    pub references: usize,
    /// Records referenced more than once
    pub shared_objects: usize,
}

impl StreamStats {
    pub fn from_document(document: &Document) -> Self {
        let mut objects_by_type = BTreeMap::new();
        let mut ref_counts: HashMap<u32, usize> = HashMap::new();
        let mut refs = Vec::new();

        for record in &document.objects {
            *objects_by_type.entry(record.type_name.clone()).or_insert(0) += 1;

            refs.clear();
            collect_refs(&record.data, &mut refs);
            for &id in &refs {
                *ref_counts.entry(id).or_insert(0) += 1;
            }
        }

        Self {
            format: document.format.clone(),
            version: document.version,
            objects_by_type,
            total_objects: document.objects.len(),
            references: ref_counts.values().sum(),
            shared_objects: ref_counts.values().filter(|&&count| count > 1).count(),
        }
    }

    pub fn count(&self, type_name: &str) -> usize {
        self.objects_by_type.get(type_name).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    #[test]
    fn test_counts_shared_references() {
        let document = Document {
            format: "tessera-scene".to_string(),
            version: 1,
            objects: vec![
                Record {
                    id: 1,
                    type_name: "SphereShape".to_string(),
                    data: json!({ "radius": 1.0 }),
                },
                Record {
                    id: 2,
                    type_name: "StaticCompoundShape".to_string(),
                    data: json!({ "sub_shapes": [
                        { "shape": { "ref": 1 } },
                        { "shape": { "ref": 1 } },
                    ] }),
                },
                Record {
                    id: 3,
                    type_name: "ScaledShape".to_string(),
                    data: json!({ "inner": { "ref": 2 } }),
                },
            ],
            root: 3,
        };

        let stats = StreamStats::from_document(&document);
        assert_eq!(stats.total_objects, 3);
        assert_eq!(stats.count("SphereShape"), 1);
        assert_eq!(stats.count("BoxShape"), 0);
        assert_eq!(stats.references, 3);
        assert_eq!(stats.shared_objects, 1);
    }
}
