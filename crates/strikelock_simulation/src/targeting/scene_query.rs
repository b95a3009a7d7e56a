//! Scene query collaborator.
//!
//! Host с физикой может подставить свою реализацию через `SceneQueryOverride`.
//! По умолчанию используется `TransformSceneQuery`: сферы-прокси, собранные
//! из ECS (Transform + CombatLayers) на текущем тике.

use bevy::prelude::*;

/// Радиус прокси-сферы, если у entity нет `ProxyRadius`
pub const DEFAULT_PROXY_RADIUS: f32 = 0.5;

/// Entity, найденная broad-phase запросом
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneEntity {
    pub entity: Entity,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneQueryError {
    #[error("scene query backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid scene query: {0}")]
    InvalidQuery(String),
}

/// Scene query interface (overlap + raycast)
pub trait SceneQuery {
    /// Все entity в радиусе `radius` от `center`, чьи layers пересекаются с mask.
    /// Порядок результата стабилен для одинакового состояния сцены.
    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        filter_mask: u32,
    ) -> Result<Vec<SceneEntity>, SceneQueryError>;

    /// Первое попадание луча
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter_mask: u32,
    ) -> Result<Option<RaycastHit>, SceneQueryError>;
}

/// Внешний scene query backend (например, физический движок host'а)
#[derive(Resource)]
pub struct SceneQueryOverride(pub Box<dyn SceneQuery + Send + Sync>);

/// Радиус прокси-сферы для raycast
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ProxyRadius(pub f32);

impl Default for ProxyRadius {
    fn default() -> Self {
        Self(DEFAULT_PROXY_RADIUS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneProxy {
    pub entity: Entity,
    pub position: Vec3,
    pub radius: f32,
    pub layers: u32,
}

/// Scene query поверх snapshot'а ECS прокси
#[derive(Debug, Clone, Default)]
pub struct TransformSceneQuery {
    proxies: Vec<SceneProxy>,
}

impl TransformSceneQuery {
    pub fn new(proxies: Vec<SceneProxy>) -> Self {
        Self { proxies }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

impl SceneQuery for TransformSceneQuery {
    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        filter_mask: u32,
    ) -> Result<Vec<SceneEntity>, SceneQueryError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(SceneQueryError::InvalidQuery(format!(
                "overlap radius {}",
                radius
            )));
        }

        Ok(self
            .proxies
            .iter()
            .filter(|proxy| proxy.layers & filter_mask != 0)
            .filter(|proxy| proxy.position.distance(center) <= radius)
            .map(|proxy| SceneEntity {
                entity: proxy.entity,
                position: proxy.position,
            })
            .collect())
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter_mask: u32,
    ) -> Result<Option<RaycastHit>, SceneQueryError> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Err(SceneQueryError::InvalidQuery(
                "raycast direction is zero".to_string(),
            ));
        }

        let mut closest: Option<RaycastHit> = None;

        for proxy in self.proxies.iter().filter(|p| p.layers & filter_mask != 0) {
            let Some(distance) = ray_sphere(origin, direction, proxy.position, proxy.radius)
            else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            // Строго меньше: при равных дистанциях выигрывает первый прокси
            if closest.map_or(true, |hit| distance < hit.distance) {
                closest = Some(RaycastHit {
                    entity: proxy.entity,
                    point: origin + direction * distance,
                    distance,
                });
            }
        }

        Ok(closest)
    }
}

/// Дистанция до первого пересечения луча со сферой (0 если origin внутри)
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(direction);
    let c = m.length_squared() - radius * radius;

    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    Some((-b - discriminant.sqrt()).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::CombatLayers;

    fn proxy(index: u32, position: Vec3, layers: u32) -> SceneProxy {
        SceneProxy {
            entity: Entity::from_raw(index),
            position,
            radius: 0.5,
            layers,
        }
    }

    fn scene() -> TransformSceneQuery {
        TransformSceneQuery::new(vec![
            proxy(1, Vec3::new(0.0, 0.0, -3.0), CombatLayers::ENEMY),
            proxy(2, Vec3::new(0.0, 0.0, -8.0), CombatLayers::ENEMY),
            proxy(3, Vec3::new(0.0, 0.0, -2.0), CombatLayers::OBSTACLE),
            proxy(4, Vec3::new(2.0, 0.0, 0.0), CombatLayers::PLAYER),
        ])
    }

    #[test]
    fn test_overlap_filters_radius_and_mask() {
        let hits = scene()
            .overlap_sphere(Vec3::ZERO, 5.0, CombatLayers::ENEMY)
            .expect("valid query");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, Entity::from_raw(1));
    }

    #[test]
    fn test_overlap_preserves_order() {
        let hits = scene()
            .overlap_sphere(Vec3::ZERO, 10.0, CombatLayers::ENEMY | CombatLayers::OBSTACLE)
            .expect("valid query");
        let order: Vec<_> = hits.iter().map(|h| h.entity.index()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_raycast_hits_closest() {
        let hit = scene()
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 20.0, CombatLayers::ALL)
            .expect("valid query")
            .expect("hit");

        assert_eq!(hit.entity, Entity::from_raw(3));
        assert!((hit.distance - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let hit = scene()
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 1.0, CombatLayers::ALL)
            .expect("valid query");
        assert!(hit.is_none());
    }

    #[test]
    fn test_invalid_queries() {
        assert!(scene()
            .raycast(Vec3::ZERO, Vec3::ZERO, 1.0, CombatLayers::ALL)
            .is_err());
        assert!(scene()
            .overlap_sphere(Vec3::ZERO, -1.0, CombatLayers::ALL)
            .is_err());
    }
}
