//! Attack timeline: authored attack definitions + clip metadata table.
//!
//! # Load-time table
//!
//! Content pipeline экспортирует клипы (`AttackClip`: длина + event markers)
//! и определения атак (`AttackDefinition`). `AttackTimeline::load` валидирует
//! всё сразу и строит таблицу `variant -> AttackClipMetadata`.
//!
//! Metadata считается один раз на уникальный клип (`MetadataCache`) и никогда
//! не пересчитывается per-attack. Ошибки authoring'а (`DefinitionError`)
//! всплывают только здесь, не во время атаки.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Deserialize;

/// Event marker внутри клипа (имя функции + timestamp)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClipMarker {
    pub name: String,
    pub time: f32,
}

/// Authored метаданные animation clip
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttackClip {
    pub name: String,
    /// Длина клипа (секунды)
    pub length: f32,
    #[serde(default)]
    pub markers: Vec<ClipMarker>,
}

/// Derived timing одного клипа
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackClipMetadata {
    pub total_duration: f32,
    /// Момент contact marker (или total_duration, если marker'а нет)
    pub contact_time: f32,
}

impl AttackClipMetadata {
    /// Hold interval после contact до completion
    pub fn hold_duration(&self) -> f32 {
        self.total_duration - self.contact_time
    }
}

/// Authored определение атаки (read-only, shared)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttackDefinition {
    pub name: String,
    /// Имя клипа из `AttackContent::clips`
    pub clip: String,
    pub damage: u32,
    /// Окно для follow-up input (combo sequencing)
    #[serde(default)]
    pub combo_window: f32,
    /// Следующая атака в цепочке (по имени)
    #[serde(default)]
    pub next_combo: Option<String>,
}

/// Сырой authored content (RON)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttackContent {
    pub clips: Vec<AttackClip>,
    pub attacks: Vec<AttackDefinition>,
}

/// Параметры derivation
#[derive(Debug, Clone)]
pub struct TimelineSettings {
    pub contact_marker: String,
    pub require_contact_marker: bool,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            contact_marker: "OnContact".to_string(),
            require_contact_marker: false,
        }
    }
}

impl From<&crate::config::CombatConfig> for TimelineSettings {
    fn from(config: &crate::config::CombatConfig) -> Self {
        Self {
            contact_marker: config.contact_marker.clone(),
            require_contact_marker: config.require_contact_marker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("clip '{clip}' has non-positive duration {length}")]
    ZeroDuration { clip: String, length: f32 },
    #[error("clip '{clip}' has no '{marker}' marker")]
    MissingContactMarker { clip: String, marker: String },
    #[error("clip '{clip}': marker at {time}s is outside [0, {length}]")]
    MarkerOutOfRange { clip: String, time: f32, length: f32 },
    #[error("attack '{attack}' references unknown clip '{clip}'")]
    MissingClip { attack: String, clip: String },
    #[error("attack '{attack}' chains into unknown attack '{next}'")]
    UnknownCombo { attack: String, next: String },
    #[error("attack content defines no attacks")]
    Empty,
    #[error("failed to parse attack content: {0}")]
    Parse(String),
}

/// Достаёт timing из authored клипа.
///
/// - длина ≤ 0 (или NaN) → `ZeroDuration`
/// - первый marker с именем `contact_marker` → `contact_time`
/// - marker'а нет → `contact_time = total_duration` (либо ошибка, если он обязателен)
pub fn derive_metadata(
    clip: &AttackClip,
    contact_marker: &str,
    require_marker: bool,
) -> Result<AttackClipMetadata, DefinitionError> {
    if !clip.length.is_finite() || clip.length <= 0.0 {
        return Err(DefinitionError::ZeroDuration {
            clip: clip.name.clone(),
            length: clip.length,
        });
    }

    let marker = clip.markers.iter().find(|m| m.name == contact_marker);

    let contact_time = match marker {
        Some(marker) => {
            if !(0.0..=clip.length).contains(&marker.time) {
                return Err(DefinitionError::MarkerOutOfRange {
                    clip: clip.name.clone(),
                    time: marker.time,
                    length: clip.length,
                });
            }
            marker.time
        }
        None if require_marker => {
            return Err(DefinitionError::MissingContactMarker {
                clip: clip.name.clone(),
                marker: contact_marker.to_string(),
            });
        }
        None => clip.length,
    };

    Ok(AttackClipMetadata {
        total_duration: clip.length,
        contact_time,
    })
}

/// Кэш metadata по имени клипа
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<String, AttackClipMetadata>,
    derivations: usize,
}

impl MetadataCache {
    pub fn get_or_derive(
        &mut self,
        clip: &AttackClip,
        settings: &TimelineSettings,
    ) -> Result<AttackClipMetadata, DefinitionError> {
        if let Some(metadata) = self.entries.get(&clip.name) {
            return Ok(*metadata);
        }

        let metadata = derive_metadata(
            clip,
            &settings.contact_marker,
            settings.require_contact_marker,
        )?;
        self.derivations += 1;
        self.entries.insert(clip.name.clone(), metadata);
        Ok(metadata)
    }

    /// Сколько раз реально сканировались markers
    pub fn derivations(&self) -> usize {
        self.derivations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validated attack table (variant index = позиция в `attacks`)
#[derive(Resource, Debug)]
pub struct AttackTimeline {
    attacks: Vec<AttackDefinition>,
    metadata: Vec<AttackClipMetadata>,
    next_combo: Vec<Option<usize>>,
    cache: MetadataCache,
}

impl AttackTimeline {
    pub fn load(
        content: AttackContent,
        settings: &TimelineSettings,
    ) -> Result<Self, DefinitionError> {
        if content.attacks.is_empty() {
            return Err(DefinitionError::Empty);
        }

        let clips: HashMap<&str, &AttackClip> = content
            .clips
            .iter()
            .map(|clip| (clip.name.as_str(), clip))
            .collect();

        let mut cache = MetadataCache::default();
        let mut metadata = Vec::with_capacity(content.attacks.len());

        for attack in &content.attacks {
            let Some(clip) = clips.get(attack.clip.as_str()) else {
                return Err(DefinitionError::MissingClip {
                    attack: attack.name.clone(),
                    clip: attack.clip.clone(),
                });
            };
            metadata.push(cache.get_or_derive(clip, settings)?);
        }

        let mut next_combo = Vec::with_capacity(content.attacks.len());
        for attack in &content.attacks {
            let index = match &attack.next_combo {
                Some(next) => Some(
                    content
                        .attacks
                        .iter()
                        .position(|candidate| &candidate.name == next)
                        .ok_or_else(|| DefinitionError::UnknownCombo {
                            attack: attack.name.clone(),
                            next: next.clone(),
                        })?,
                ),
                None => None,
            };
            next_combo.push(index);
        }

        crate::logger::log_info(&format!(
            "📼 Attack timeline loaded: {} attacks, {} distinct clips",
            content.attacks.len(),
            cache.len()
        ));

        Ok(Self {
            attacks: content.attacks,
            metadata,
            next_combo,
            cache,
        })
    }

    pub fn from_ron(text: &str, settings: &TimelineSettings) -> Result<Self, DefinitionError> {
        let content: AttackContent =
            ron::from_str(text).map_err(|e| DefinitionError::Parse(e.to_string()))?;
        Self::load(content, settings)
    }

    /// Количество variants
    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }

    pub fn definition(&self, variant: usize) -> Option<&AttackDefinition> {
        self.attacks.get(variant)
    }

    /// Timing variant'а; `None` если для индекса нет клипа
    pub fn metadata(&self, variant: usize) -> Option<AttackClipMetadata> {
        self.metadata.get(variant).copied()
    }

    pub fn next_combo(&self, variant: usize) -> Option<usize> {
        self.next_combo.get(variant).copied().flatten()
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(name: &str, length: f32, contact: Option<f32>) -> AttackClip {
        AttackClip {
            name: name.to_string(),
            length,
            markers: contact
                .map(|time| {
                    vec![
                        ClipMarker {
                            name: "FootStep".to_string(),
                            time: 0.1,
                        },
                        ClipMarker {
                            name: "OnContact".to_string(),
                            time,
                        },
                    ]
                })
                .unwrap_or_default(),
        }
    }

    fn attack(name: &str, clip: &str, next: Option<&str>) -> AttackDefinition {
        AttackDefinition {
            name: name.to_string(),
            clip: clip.to_string(),
            damage: 10,
            combo_window: 0.5,
            next_combo: next.map(str::to_string),
        }
    }

    #[test]
    fn test_contact_marker_time() {
        let metadata = derive_metadata(&clip("Punch", 1.0, Some(0.4)), "OnContact", false)
            .expect("valid clip");
        assert_eq!(metadata.total_duration, 1.0);
        assert_eq!(metadata.contact_time, 0.4);
        assert!((metadata.hold_duration() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_missing_marker_defaults_to_end() {
        let metadata =
            derive_metadata(&clip("Kick", 0.8, None), "OnContact", false).expect("valid clip");
        assert_eq!(metadata.contact_time, 0.8);
    }

    #[test]
    fn test_missing_marker_required() {
        let result = derive_metadata(&clip("Kick", 0.8, None), "OnContact", true);
        assert!(matches!(
            result,
            Err(DefinitionError::MissingContactMarker { .. })
        ));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let result = derive_metadata(&clip("Broken", 0.0, None), "OnContact", false);
        assert!(matches!(result, Err(DefinitionError::ZeroDuration { .. })));
    }

    #[test]
    fn test_marker_out_of_range_rejected() {
        let result = derive_metadata(&clip("Late", 0.5, Some(0.9)), "OnContact", false);
        assert!(matches!(result, Err(DefinitionError::MarkerOutOfRange { .. })));
    }

    #[test]
    fn test_metadata_derived_once_per_clip() {
        let content = AttackContent {
            clips: vec![clip("Punch", 1.0, Some(0.4)), clip("Kick", 1.2, Some(0.5))],
            attacks: vec![
                attack("Jab", "Punch", None),
                attack("Cross", "Punch", None),
                attack("Hook", "Punch", None),
                attack("Roundhouse", "Kick", None),
            ],
        };

        let timeline =
            AttackTimeline::load(content, &TimelineSettings::default()).expect("valid content");

        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.cache().derivations(), 2);
        assert_eq!(timeline.metadata(2), timeline.metadata(0));
        assert_eq!(timeline.metadata(3).map(|m| m.contact_time), Some(0.5));
        assert_eq!(timeline.metadata(4), None);
    }

    #[test]
    fn test_zero_duration_fails_at_load() {
        let content = AttackContent {
            clips: vec![clip("Broken", 0.0, None)],
            attacks: vec![attack("Jab", "Broken", None)],
        };
        let result = AttackTimeline::load(content, &TimelineSettings::default());
        assert!(matches!(result, Err(DefinitionError::ZeroDuration { .. })));
    }

    #[test]
    fn test_unknown_clip_and_combo() {
        let missing_clip = AttackContent {
            clips: vec![],
            attacks: vec![attack("Jab", "Punch", None)],
        };
        assert!(matches!(
            AttackTimeline::load(missing_clip, &TimelineSettings::default()),
            Err(DefinitionError::MissingClip { .. })
        ));

        let dangling = AttackContent {
            clips: vec![clip("Punch", 1.0, Some(0.4))],
            attacks: vec![attack("Jab", "Punch", Some("Uppercut"))],
        };
        assert!(matches!(
            AttackTimeline::load(dangling, &TimelineSettings::default()),
            Err(DefinitionError::UnknownCombo { .. })
        ));

        assert_eq!(
            AttackTimeline::load(AttackContent::default(), &TimelineSettings::default()).err(),
            Some(DefinitionError::Empty)
        );
    }

    #[test]
    fn test_combo_links_resolved() {
        let content = AttackContent {
            clips: vec![clip("Punch", 1.0, Some(0.4))],
            attacks: vec![
                attack("Jab", "Punch", Some("Cross")),
                attack("Cross", "Punch", None),
            ],
        };
        let timeline =
            AttackTimeline::load(content, &TimelineSettings::default()).expect("valid content");
        assert_eq!(timeline.next_combo(0), Some(1));
        assert_eq!(timeline.next_combo(1), None);
    }

    #[test]
    fn test_from_ron() {
        let text = r#"(
            clips: [
                (name: "Punch", length: 1.0, markers: [(name: "OnContact", time: 0.4)]),
            ],
            attacks: [
                (name: "Jab", clip: "Punch", damage: 12),
            ],
        )"#;
        let timeline =
            AttackTimeline::from_ron(text, &TimelineSettings::default()).expect("valid ron");
        assert_eq!(timeline.definition(0).map(|d| d.damage), Some(12));
        assert_eq!(timeline.metadata(0).map(|m| m.contact_time), Some(0.4));

        let broken = AttackTimeline::from_ron("(clips: [", &TimelineSettings::default());
        assert!(matches!(broken, Err(DefinitionError::Parse(_))));
    }
}
