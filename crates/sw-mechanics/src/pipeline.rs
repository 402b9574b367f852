//! The two-phase preparation pipeline.
//!
//! Phase one computes the derived block; phase two resolves equipment from
//! that block. Both land in a single patch written with a version check.
//! When the patch would change nothing the write is skipped, so preparing
//! an unchanged entity never triggers another refresh.

use sw_core::{CoreError, DerivedStats, EntityId, EntityStore, Patch};

use crate::config::RuleConfig;
use crate::derived::{compute_derived_stats, derived_patch};
use crate::equipment::{EquipmentEffect, equipment_patch, resolve_equipment_effects, stored_equipment};
use crate::error::MechResult;

/// How many times a write is retried after losing a version race.
pub const MAX_ATTEMPTS: u32 = 3;

/// What a preparation pass computed and whether it wrote anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preparation {
    /// The fresh derived block, `None` for custom kinds.
    pub derived: Option<DerivedStats>,
    /// The resolved equipment, `None` for non-combatants.
    pub equipment: Option<EquipmentEffect>,
    /// Whether a patch was written.
    pub written: bool,
    /// Entity version after the pass.
    pub version: u64,
    /// Snapshots read, including retries.
    pub attempts: u32,
}

/// Recompute and persist an entity's derived block and equipment state.
pub async fn prepare_entity<S: EntityStore + ?Sized>(
    store: &S,
    id: EntityId,
    config: &RuleConfig,
) -> MechResult<Preparation> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let entity = store.get(id).await?;

        let derived = compute_derived_stats(&entity, config)?;
        let equipment = derived
            .as_ref()
            .and_then(|d| resolve_equipment_effects(&entity, d, config));

        let mut patch = Patch::new();
        if let Some(derived) = &derived {
            patch.merge(derived_patch(derived)?);
        }
        if let Some(effect) = &equipment {
            if stored_equipment(&entity) != Some(&effect.to_state()) {
                patch.merge(equipment_patch(&entity, effect)?);
            }
        }

        if patch.is_empty() || patch.is_noop_for(&entity)? {
            tracing::info!(entity = %entity.name, version = entity.version, "preparation unchanged, skipping write");
            return Ok(Preparation {
                derived,
                equipment,
                written: false,
                version: entity.version,
                attempts,
            });
        }

        match store.apply_patch(id, &patch, Some(entity.version)).await {
            Ok(version) => {
                tracing::debug!(entity = %entity.name, version, paths = patch.len(), "prepared entity");
                return Ok(Preparation {
                    derived,
                    equipment,
                    written: true,
                    version,
                    attempts,
                });
            }
            Err(CoreError::VersionConflict { expected, found, .. }) if attempts < MAX_ATTEMPTS => {
                tracing::debug!(entity = %entity.name, expected, found, "entity changed during preparation, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
}
