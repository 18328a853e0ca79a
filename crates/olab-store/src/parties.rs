use std::collections::HashMap;
use std::sync::RwLock;

use olab_engine::EngineError;
use olab_schemas::Party;
use uuid::Uuid;

/// Known counterparties (clinics and independent practitioners).
///
/// Read-mostly: the pricing path only ever samples a discount percent from
/// here; mutation is limited to registration and the separately guarded
/// discount update.
#[derive(Debug, Default)]
pub struct PartyDirectory {
    parties: RwLock<HashMap<Uuid, Party>>,
}

impl PartyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, party: Party) {
        self.locked_mut().insert(party.party_id, party);
    }

    pub fn get(&self, party_id: Uuid) -> Option<Party> {
        self.locked().get(&party_id).cloned()
    }

    /// All parties, sorted by name for stable listings.
    pub fn list(&self) -> Vec<Party> {
        let mut out: Vec<Party> = self.locked().values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Case-insensitive substring match in either direction against known
    /// party names. Ties resolve to the lexicographically first name so the
    /// result is deterministic.
    pub fn find_fuzzy(&self, name: &str) -> Option<Party> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let mut candidates: Vec<Party> = self
            .locked()
            .values()
            .filter(|p| {
                let known = p.name.to_lowercase();
                known.contains(&needle) || needle.contains(&known)
            })
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        candidates.into_iter().next()
    }

    /// Update a party's discount percent. Takes effect only for orders
    /// created or edited afterwards; existing price snapshots are untouched.
    pub fn set_discount(&self, party_id: Uuid, discount_pct: u32) -> Result<Party, EngineError> {
        if discount_pct > 100 {
            return Err(EngineError::validation(format!(
                "discount percent out of range: {discount_pct}"
            )));
        }
        let mut parties = self.locked_mut();
        let party = parties
            .get_mut(&party_id)
            .ok_or(EngineError::NotFound { what: "party" })?;
        party.discount_pct = discount_pct;
        Ok(party.clone())
    }

    fn locked(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Party>> {
        match self.parties.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn locked_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Party>> {
        match self.parties.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
