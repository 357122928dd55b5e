use crate::TermId;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Bidirectional term <-> id table.
///
/// Ids are handed out contiguously in first-occurrence order while indexing, so
/// they depend on corpus order and carry no meaning of their own. Use
/// [`Lexicon::sorted`] when ids must be stable across builds.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(try_from = "HashMap<String, TermId>")]
pub struct Lexicon {
    ids: HashMap<String, TermId>,
    terms: Vec<String>,
}

impl Lexicon {
    pub fn new() -> Self { Self::default() }

    pub fn get_or_insert(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.ids.insert(term.to_string(), id);
        self.terms.push(term.to_string());
        id
    }

    pub fn id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Terms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TermId)> {
        self.terms.iter().enumerate().map(|(id, t)| (t.as_str(), id as TermId))
    }

    /// Same vocabulary with ids reassigned in ascending term order.
    /// The second value maps each old id to its new id.
    pub fn sorted(&self) -> (Lexicon, Vec<TermId>) {
        let mut order: Vec<TermId> = (0..self.terms.len() as TermId).collect();
        order.sort_by(|&a, &b| self.terms[a as usize].cmp(&self.terms[b as usize]));
        let mut remap = vec![0; self.terms.len()];
        let mut sorted = Lexicon::new();
        for old in order {
            remap[old as usize] = sorted.get_or_insert(&self.terms[old as usize]);
        }
        (sorted, remap)
    }
}

impl TryFrom<HashMap<String, TermId>> for Lexicon {
    type Error = String;

    fn try_from(ids: HashMap<String, TermId>) -> Result<Self, Self::Error> {
        let mut slots: Vec<Option<String>> = vec![None; ids.len()];
        for (term, &id) in &ids {
            let slot = slots
                .get_mut(id as usize)
                .ok_or_else(|| format!("id {id} out of range for {} terms", ids.len()))?;
            if let Some(other) = slot {
                return Err(format!("id {id} assigned to both {other:?} and {term:?}"));
            }
            *slot = Some(term.clone());
        }
        let terms = slots.into_iter().map(|t| t.unwrap_or_default()).collect();
        Ok(Self { ids, terms })
    }
}

impl Serialize for Lexicon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
