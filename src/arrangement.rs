//! Расстановка актуаторов.
//!
//! Расстановка - последовательность фрагментов `(позиция, нормаль)`, которую
//! поставляет внешний источник. Движок использует её как вход стадии
//! геометрии и для вычисления `iResolution`.

use serde::{Deserialize, Serialize};

/// Один актуатор: позиция и нормаль в пространстве дисплея.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub position: [f64; 3],
    pub normal: [f64; 3],
}

impl Fragment {
    pub fn new(position: [f64; 3], normal: [f64; 3]) -> Self {
        Self { position, normal }
    }
}

/// Габариты расстановки: `max - min` по каждой оси. Пустая расстановка
/// даёт `(0, 0, 0)`.
pub fn fragment_resolution(arrangement: &[Fragment]) -> [f64; 3] {
    let Some(first) = arrangement.first() else {
        return [0.0; 3];
    };
    let (lo, hi) = arrangement.iter().fold(
        (first.position, first.position),
        |(mut lo, mut hi), fragment| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(fragment.position[axis]);
                hi[axis] = hi[axis].max(fragment.position[axis]);
            }
            (lo, hi)
        },
    );
    [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]]
}

/// Решётка `(x_count + 1) x (z_count + 1)` в плоскости XZ с нормалью `+Y`.
///
/// Удобна для отладки шейдеров без реального устройства.
pub fn uniform_rect(x_count: u32, z_count: u32, x_spacing: f64, z_spacing: f64) -> Vec<Fragment> {
    let normal = [0.0, 1.0, 0.0];
    (0..=x_count)
        .flat_map(|x| {
            (0..=z_count).map(move |z| {
                Fragment::new([f64::from(x) * x_spacing, 0.0, f64::from(z) * z_spacing], normal)
            })
        })
        .collect()
}
