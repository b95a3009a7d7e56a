//! Targeting: scene query collaborator + target detector.

use bevy::prelude::*;

use crate::components::CombatLayers;

pub mod detector;
pub mod scene_query;

#[cfg(test)]
mod detector_tests;

pub use detector::*;
pub use scene_query::*;

/// Snapshot всех entity со слоями в `TransformSceneQuery`.
///
/// Прокси отсортированы по entity index: это и есть scene-query order,
/// по которому детектор разрешает точные ничьи.
pub fn collect_scene_proxies<'a>(
    items: impl Iterator<Item = (Entity, &'a Transform, &'a CombatLayers, Option<&'a ProxyRadius>)>,
) -> TransformSceneQuery {
    let mut proxies: Vec<SceneProxy> = items
        .map(|(entity, transform, layers, radius)| SceneProxy {
            entity,
            position: transform.translation,
            radius: radius.copied().unwrap_or_default().0,
            layers: layers.0,
        })
        .collect();

    proxies.sort_by_key(|proxy| proxy.entity.index());

    TransformSceneQuery::new(proxies)
}
