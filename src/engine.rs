//! Движок исполнения конвейера.
//!
//! Один такт ([`Engine::execute`]) проходит три стадии по порядку:
//!
//! 1. **geometry** - для каждого фрагмента расстановки вычисляет новую
//!    позицию и нормаль (без шейдера расстановка проходит как есть);
//! 2. **fragment** - для каждого результата геометрии вычисляет высоту и угол;
//! 3. **pixel** - для каждого результата геометрии и каждого субпикселя
//!    профиля устройства вычисляет цвет.
//!
//! Встроенные uniform привязываются заново на каждом запуске. Ошибка любой
//! стадии возвращается помеченной этой стадией ([`StageError`]); состояние
//! движка при этом не откатывается и не повреждается.
//!
//! Замена шейдера ([`Engine::install`]) переносит значения пользовательских
//! uniform со старого экземпляра на новый. Атомарность замены относительно
//! такта обеспечивается `&mut self`: при разделении движка между потоками
//! его оборачивают в мьютекс.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arrangement::{fragment_resolution, Fragment};
use crate::compiler::builtins::{
    FRAG_ANGLE_OUT, FRAG_COORD, FRAG_COORD_OUT, FRAG_COUNT, FRAG_HEIGHT_OUT, FRAG_ID, FRAG_NORMAL,
    FRAG_NORMAL_OUT, GLOBAL_TIME, PIXEL_COLOR_OUT, PIXEL_COORD, PIXEL_RESOLUTION, RESOLUTION,
};
use crate::compiler::ShaderKind;
use crate::runtime::{RuntimeError, Shader, Val};

/// Параметры устройства.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Число субпикселей на фрагмент по X и Y.
    pub pixel_resolution: [u32; 2],
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            pixel_resolution: [1, 1],
        }
    }
}

/// Результат стадии fragment для одного фрагмента.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FragmentState {
    pub height: f64,
    pub angle: f64,
}

/// Результат одного такта.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub geometry: Vec<Fragment>,
    pub fragment: Vec<FragmentState>,
    /// Для каждого фрагмента цвета субпикселей: `x` снаружи, `y` внутри.
    pub pixel: Vec<Vec<[f64; 4]>>,
}

/// Причина сбоя внутри стадии.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageFault {
    #[error("shader did not set '{0}'")]
    MissingOutput(&'static str),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Сбой такта, помеченный стадией.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("geometry stage: {0}")]
    Geometry(StageFault),

    #[error("fragment stage: {0}")]
    Fragment(StageFault),

    #[error("pixel stage: {0}")]
    Pixel(StageFault),
}

impl StageError {
    fn tagged(kind: ShaderKind, fault: StageFault) -> Self {
        match kind {
            ShaderKind::Geometry => StageError::Geometry(fault),
            ShaderKind::Fragment => StageError::Fragment(fault),
            ShaderKind::Pixel => StageError::Pixel(fault),
        }
    }

    /// Стадия, в которой произошёл сбой.
    pub fn stage(&self) -> ShaderKind {
        match self {
            StageError::Geometry(_) => ShaderKind::Geometry,
            StageError::Fragment(_) => ShaderKind::Fragment,
            StageError::Pixel(_) => ShaderKind::Pixel,
        }
    }

    pub fn fault(&self) -> &StageFault {
        match self {
            StageError::Geometry(fault) | StageError::Fragment(fault) | StageError::Pixel(fault) => {
                fault
            }
        }
    }
}

/// Ошибка управления движком (не такта).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("cannot install a {found} shader into the {expected} stage")]
    KindMismatch {
        expected: ShaderKind,
        found: ShaderKind,
    },

    #[error("no {0} shader installed")]
    NotInstalled(ShaderKind),

    #[error(transparent)]
    Binding(#[from] RuntimeError),
}

#[derive(Debug)]
struct Stage {
    shader: Option<Shader>,
    enabled: bool,
}

impl Stage {
    fn new() -> Self {
        Self {
            shader: None,
            enabled: true,
        }
    }

    /// Шейдер, если он установлен и стадия включена.
    fn active(&mut self) -> Option<&mut Shader> {
        if self.enabled {
            self.shader.as_mut()
        } else {
            None
        }
    }
}

/// Движок исполнения: три стадии, расстановка и профиль устройства.
#[derive(Debug)]
pub struct Engine {
    profile: DeviceProfile,
    arrangement: Vec<Fragment>,
    resolution: [f64; 3],
    start: Instant,
    geometry: Stage,
    fragment: Stage,
    pixel: Stage,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DeviceProfile::default())
    }
}

impl Engine {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            arrangement: Vec::new(),
            resolution: [0.0; 3],
            start: Instant::now(),
            geometry: Stage::new(),
            fragment: Stage::new(),
            pixel: Stage::new(),
        }
    }

    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    pub fn set_profile(&mut self, profile: DeviceProfile) {
        self.profile = profile;
    }

    pub fn arrangement(&self) -> &[Fragment] {
        &self.arrangement
    }

    /// Заменить расстановку целиком и пересчитать её габариты.
    pub fn set_arrangement(&mut self, arrangement: Vec<Fragment>) {
        self.resolution = fragment_resolution(&arrangement);
        debug!(
            "arrangement of {} fragments, resolution {:?}",
            arrangement.len(),
            self.resolution
        );
        self.arrangement = arrangement;
    }

    pub fn fragment_resolution(&self) -> [f64; 3] {
        self.resolution
    }

    /// Перезапустить отсчёт `iGlobalTime`.
    pub fn reset_time(&mut self) {
        self.start = Instant::now();
    }

    fn stage(&self, kind: ShaderKind) -> &Stage {
        match kind {
            ShaderKind::Geometry => &self.geometry,
            ShaderKind::Fragment => &self.fragment,
            ShaderKind::Pixel => &self.pixel,
        }
    }

    fn stage_mut(&mut self, kind: ShaderKind) -> &mut Stage {
        match kind {
            ShaderKind::Geometry => &mut self.geometry,
            ShaderKind::Fragment => &mut self.fragment,
            ShaderKind::Pixel => &mut self.pixel,
        }
    }

    pub fn shader(&self, kind: ShaderKind) -> Option<&Shader> {
        self.stage(kind).shader.as_ref()
    }

    pub fn is_enabled(&self, kind: ShaderKind) -> bool {
        self.stage(kind).enabled
    }

    /// Выключенная стадия ведёт себя как отсутствующая.
    pub fn set_enabled(&mut self, kind: ShaderKind, enabled: bool) {
        self.stage_mut(kind).enabled = enabled;
    }

    /// Установить шейдер в стадию `kind`, вернув предыдущий.
    ///
    /// Значения пользовательских uniform предыдущего шейдера переносятся на
    /// новый, если у него есть uniform с тем же именем и типом. Остальные
    /// значения отбрасываются с предупреждением в журнале.
    pub fn install(&mut self, kind: ShaderKind, mut shader: Shader) -> Result<Option<Shader>, EngineError> {
        if shader.kind() != kind {
            return Err(EngineError::KindMismatch {
                expected: kind,
                found: shader.kind(),
            });
        }

        let stage = self.stage_mut(kind);
        if let Some(old) = &stage.shader {
            for (name, value) in old.custom_uniforms() {
                let carried = shader.uniform_type(&name) == Some(value.ty()) && !shader.is_builtin(&name);
                if carried {
                    shader.bind_one(&name, value)?;
                } else {
                    warn!("{kind} shader: dropping value of uniform '{name}' ({value}) on hot-swap");
                }
            }
        }
        debug!(
            "installed {kind} shader with {} uniforms",
            shader.known_uniforms().len()
        );
        Ok(stage.shader.replace(shader))
    }

    /// Убрать шейдер из стадии.
    pub fn remove(&mut self, kind: ShaderKind) -> Option<Shader> {
        self.stage_mut(kind).shader.take()
    }

    /// Привязать пользовательские uniform шейдера стадии `kind`.
    pub fn bind<I, S>(&mut self, kind: ShaderKind, pairs: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = (S, Val)>,
        S: AsRef<str>,
    {
        let shader = self
            .stage_mut(kind)
            .shader
            .as_mut()
            .ok_or(EngineError::NotInstalled(kind))?;
        shader.bind(pairs)?;
        Ok(())
    }

    /// Текущие значения пользовательских uniform стадии (пусто без шейдера).
    pub fn custom_uniforms(&self, kind: ShaderKind) -> Vec<(String, Val)> {
        self.shader(kind)
            .map(Shader::custom_uniforms)
            .unwrap_or_default()
    }

    /// Один такт с временем от последнего [`Engine::reset_time`].
    pub fn execute(&mut self) -> Result<Frame, StageError> {
        let elapsed = self.start.elapsed();
        self.execute_at(elapsed)
    }

    /// Один такт с заданным значением `iGlobalTime`.
    pub fn execute_at(&mut self, elapsed: Duration) -> Result<Frame, StageError> {
        let time = elapsed.as_secs_f64();
        trace!("tick at {time:.3}s over {} fragments", self.arrangement.len());

        let geometry = match self.geometry.active() {
            Some(shader) => compute_geometry(shader, time, self.resolution, &self.arrangement)
                .map_err(|fault| StageError::tagged(ShaderKind::Geometry, fault))?,
            None => self.arrangement.clone(),
        };

        let fragment = match self.fragment.active() {
            Some(shader) => compute_fragment(shader, time, &geometry)
                .map_err(|fault| StageError::tagged(ShaderKind::Fragment, fault))?,
            None => Vec::new(),
        };

        let pixel = match self.pixel.active() {
            Some(shader) => compute_pixel(shader, time, self.profile, &geometry)
                .map_err(|fault| StageError::tagged(ShaderKind::Pixel, fault))?,
            None => Vec::new(),
        };

        Ok(Frame {
            geometry,
            fragment,
            pixel,
        })
    }
}

fn compute_geometry(
    shader: &mut Shader,
    time: f64,
    resolution: [f64; 3],
    arrangement: &[Fragment],
) -> Result<Vec<Fragment>, StageFault> {
    let count = index_value(arrangement.len());
    arrangement
        .iter()
        .enumerate()
        .map(|(id, fragment)| {
            shader.bind([
                (GLOBAL_TIME, Val::Float(time)),
                (RESOLUTION, Val::Vec3(resolution)),
                (FRAG_COUNT, count),
                (FRAG_ID, index_value(id)),
                (FRAG_COORD, Val::Vec3(fragment.position)),
                (FRAG_NORMAL, Val::Vec3(fragment.normal)),
            ])?;
            shader.run()?;
            ensure_outputs(shader)?;
            Ok(Fragment::new(
                vec3_output(shader, FRAG_COORD_OUT)?,
                vec3_output(shader, FRAG_NORMAL_OUT)?,
            ))
        })
        .collect()
}

fn compute_fragment(
    shader: &mut Shader,
    time: f64,
    geometry: &[Fragment],
) -> Result<Vec<FragmentState>, StageFault> {
    geometry
        .iter()
        .map(|fragment| {
            shader.bind([
                (GLOBAL_TIME, Val::Float(time)),
                (FRAG_COORD, Val::Vec3(fragment.position)),
                (FRAG_NORMAL, Val::Vec3(fragment.normal)),
            ])?;
            shader.run()?;
            ensure_outputs(shader)?;
            Ok(FragmentState {
                height: float_output(shader, FRAG_HEIGHT_OUT)?,
                angle: float_output(shader, FRAG_ANGLE_OUT)?,
            })
        })
        .collect()
}

/// Верхняя граница предварительного резерва под пиксели одного фрагмента.
const PIXEL_RESERVE_LIMIT: usize = 1 << 16;

fn pixel_capacity(width: u32, height: u32) -> usize {
    let pixels = u64::from(width) * u64::from(height);
    usize::try_from(pixels).map_or(PIXEL_RESERVE_LIMIT, |n| n.min(PIXEL_RESERVE_LIMIT))
}

fn compute_pixel(
    shader: &mut Shader,
    time: f64,
    profile: DeviceProfile,
    geometry: &[Fragment],
) -> Result<Vec<Vec<[f64; 4]>>, StageFault> {
    let [width, height] = profile.pixel_resolution;
    let resolution = Val::Vec2([f64::from(width), f64::from(height)]);
    geometry
        .iter()
        .map(|fragment| {
            let mut colors = Vec::with_capacity(pixel_capacity(width, height));
            for x in 0..width {
                for y in 0..height {
                    shader.bind([
                        (GLOBAL_TIME, Val::Float(time)),
                        (FRAG_COORD, Val::Vec3(fragment.position)),
                        (FRAG_NORMAL, Val::Vec3(fragment.normal)),
                        (PIXEL_COORD, Val::Vec2([f64::from(x), f64::from(y)])),
                        (PIXEL_RESOLUTION, resolution),
                    ])?;
                    shader.run()?;
                    ensure_outputs(shader)?;
                    match shader.uniform(PIXEL_COLOR_OUT) {
                        Some(Val::Vec4(color)) => colors.push(*color),
                        _ => return Err(output_fault(PIXEL_COLOR_OUT)),
                    }
                }
            }
            Ok(colors)
        })
        .collect()
}

fn index_value(index: usize) -> Val {
    Val::Int(i64::try_from(index).unwrap_or(i64::MAX))
}

fn ensure_outputs(shader: &Shader) -> Result<(), StageFault> {
    match shader.missing_output() {
        Some(name) => Err(StageFault::MissingOutput(name)),
        None => Ok(()),
    }
}

fn output_fault(name: &str) -> StageFault {
    StageFault::Runtime(RuntimeError::TypeFault(format!("output '{name}' has an unexpected type")))
}

fn vec3_output(shader: &Shader, name: &'static str) -> Result<[f64; 3], StageFault> {
    match shader.uniform(name) {
        Some(Val::Vec3(v)) => Ok(*v),
        None => Err(StageFault::MissingOutput(name)),
        Some(_) => Err(output_fault(name)),
    }
}

fn float_output(shader: &Shader, name: &'static str) -> Result<f64, StageFault> {
    match shader.uniform(name) {
        Some(Val::Float(v)) => Ok(*v),
        None => Err(StageFault::MissingOutput(name)),
        Some(_) => Err(output_fault(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::uniform_rect;
    use crate::codegen::{Backend, LowerBackend};
    use crate::compiler::compile;
    use crate::parser::parse;

    fn shader(kind: ShaderKind, source: &str) -> Shader {
        let program = compile(&parse(source).unwrap(), kind).unwrap();
        LowerBackend.generate(&program).unwrap()
    }

    fn at(x: f64, y: f64, z: f64) -> Fragment {
        Fragment::new([x, y, z], [0.0, 1.0, 0.0])
    }

    const LIFT: &str = "void main() {
        sd_FragCoord = iFragCoord + vec3(0.0, float(iFragID), 0.0);
        sd_FragNormal = iFragNormal;
    }";

    const HEIGHT: &str = "uniform float customGain;
        void main() { sd_FragHeight = iFragCoord.y * customGain; sd_FragAngle = iGlobalTime; }";

    #[test]
    fn test_arrangement_resolution() {
        let mut engine = Engine::default();
        assert_eq!(engine.fragment_resolution(), [0.0, 0.0, 0.0]);
        engine.set_arrangement(vec![at(0.0, 0.0, 0.0), at(10.0, 0.0, 0.0), at(0.0, 5.0, 0.0)]);
        assert_eq!(engine.fragment_resolution(), [10.0, 5.0, 0.0]);
        engine.set_arrangement(Vec::new());
        assert_eq!(engine.fragment_resolution(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pass_through_without_shaders() {
        let mut engine = Engine::default();
        engine.set_arrangement(uniform_rect(1, 1, 1.0, 1.0));
        let frame = engine.execute().unwrap();
        assert_eq!(frame.geometry, engine.arrangement());
        assert!(frame.fragment.is_empty());
        assert!(frame.pixel.is_empty());
    }

    #[test]
    fn test_full_pipeline() {
        let mut engine = Engine::new(DeviceProfile {
            pixel_resolution: [2, 3],
        });
        engine.set_arrangement(vec![at(0.0, 0.0, 0.0), at(4.0, 1.0, 0.0)]);
        engine
            .install(ShaderKind::Geometry, shader(ShaderKind::Geometry, LIFT))
            .unwrap();
        engine
            .install(ShaderKind::Fragment, shader(ShaderKind::Fragment, HEIGHT))
            .unwrap();
        engine
            .install(
                ShaderKind::Pixel,
                shader(
                    ShaderKind::Pixel,
                    "void main() { sd_PixelColor = vec4(iPixelCoord, iPixelResolution.x, iPixelResolution.y); }",
                ),
            )
            .unwrap();

        let frame = engine.execute_at(Duration::from_millis(1500)).unwrap();
        assert_eq!(frame.geometry, vec![at(0.0, 0.0, 0.0), at(4.0, 2.0, 0.0)]);
        assert_eq!(
            frame.fragment,
            vec![
                FragmentState { height: 0.0, angle: 1.5 },
                FragmentState { height: 2.0, angle: 1.5 },
            ]
        );
        assert_eq!(frame.pixel.len(), 2);
        assert_eq!(frame.pixel[1].len(), 6);
        assert_eq!(frame.pixel[1][0], [0.0, 0.0, 2.0, 3.0]);
        assert_eq!(frame.pixel[1][1], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(frame.pixel[1][5], [1.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_geometry_missing_output() {
        let mut engine = Engine::default();
        engine.set_arrangement(vec![at(0.0, 0.0, 0.0)]);
        engine
            .install(
                ShaderKind::Geometry,
                shader(ShaderKind::Geometry, "void main() { sd_FragNormal = iFragNormal; }"),
            )
            .unwrap();
        let err = engine.execute().unwrap_err();
        assert_eq!(err.stage(), ShaderKind::Geometry);
        assert_eq!(err, StageError::Geometry(StageFault::MissingOutput("sd_FragCoord")));
    }

    #[test]
    fn test_runtime_fault_tagged_with_stage() {
        let faulty = "uniform int divisor; void main() { int q = 1 / (divisor - 1); }";
        let mut engine = Engine::default();
        engine.set_arrangement(vec![at(0.0, 0.0, 0.0)]);

        engine
            .install(ShaderKind::Fragment, shader(ShaderKind::Fragment, faulty))
            .unwrap();
        let err = engine.execute().unwrap_err();
        assert_eq!(err.stage(), ShaderKind::Fragment);
        assert_eq!(err.fault(), &StageFault::Runtime(RuntimeError::DivisionByZero));

        engine.remove(ShaderKind::Fragment);
        engine
            .install(ShaderKind::Pixel, shader(ShaderKind::Pixel, faulty))
            .unwrap();
        let err = engine.execute().unwrap_err();
        assert_eq!(err, StageError::Pixel(StageFault::Runtime(RuntimeError::DivisionByZero)));
    }

    #[test]
    fn test_pixel_reserve_is_bounded() {
        assert_eq!(pixel_capacity(2, 3), 6);
        assert_eq!(pixel_capacity(0, u32::MAX), 0);
        assert_eq!(pixel_capacity(u32::MAX, u32::MAX), PIXEL_RESERVE_LIMIT);

        let mut engine = Engine::new(DeviceProfile {
            pixel_resolution: [u32::MAX, u32::MAX],
        });
        engine.set_arrangement(vec![at(0.0, 0.0, 0.0)]);
        engine
            .install(
                ShaderKind::Pixel,
                shader(
                    ShaderKind::Pixel,
                    "uniform int divisor; void main() { int q = 1 / (divisor - 1); }",
                ),
            )
            .unwrap();
        let err = engine.execute().unwrap_err();
        assert_eq!(err, StageError::Pixel(StageFault::Runtime(RuntimeError::DivisionByZero)));
    }

    #[test]
    fn test_failed_tick_keeps_engine_state() {
        let mut engine = Engine::default();
        engine.set_arrangement(vec![at(0.0, 0.0, 0.0)]);
        engine
            .install(
                ShaderKind::Fragment,
                shader(
                    ShaderKind::Fragment,
                    "uniform int mode; void main() { if (mode == 1) { sd_FragHeight = 1.0; sd_FragAngle = 0.0; } }",
                ),
            )
            .unwrap();
        engine.bind(ShaderKind::Fragment, [("mode", Val::Int(0))]).unwrap();
        assert!(engine.execute().is_err());
        assert_eq!(engine.arrangement().len(), 1);
        assert_eq!(engine.custom_uniforms(ShaderKind::Fragment), vec![("mode".to_string(), Val::Int(0))]);

        engine.bind(ShaderKind::Fragment, [("mode", Val::Int(1))]).unwrap();
        let frame = engine.execute().unwrap();
        assert_eq!(frame.fragment, vec![FragmentState { height: 1.0, angle: 0.0 }]);
    }

    #[test]
    fn test_hot_swap_preserves_custom_uniforms() {
        let mut engine = Engine::default();
        engine.set_arrangement(vec![at(0.0, 2.0, 0.0)]);
        engine
            .install(ShaderKind::Fragment, shader(ShaderKind::Fragment, HEIGHT))
            .unwrap();
        engine
            .bind(ShaderKind::Fragment, [("customGain", Val::Float(0.7))])
            .unwrap();

        let edited = "uniform float customGain; uniform int steps;
            void main() { sd_FragHeight = customGain; sd_FragAngle = float(steps); }";
        let old = engine
            .install(ShaderKind::Fragment, shader(ShaderKind::Fragment, edited))
            .unwrap();
        assert!(old.is_some());

        let new = engine.shader(ShaderKind::Fragment).unwrap();
        assert_eq!(new.uniform("customGain"), Some(&Val::Float(0.7)));
        assert_eq!(new.uniform("steps"), Some(&Val::Int(1)));

        let frame = engine.execute().unwrap();
        assert_eq!(frame.fragment, vec![FragmentState { height: 0.7, angle: 1.0 }]);
    }

    #[test]
    fn test_hot_swap_drops_retyped_uniforms() {
        let mut engine = Engine::default();
        engine
            .install(
                ShaderKind::Fragment,
                shader(ShaderKind::Fragment, "uniform float gain; void main() { }"),
            )
            .unwrap();
        engine.bind(ShaderKind::Fragment, [("gain", Val::Float(0.2))]).unwrap();
        engine
            .install(
                ShaderKind::Fragment,
                shader(ShaderKind::Fragment, "uniform int gain; void main() { }"),
            )
            .unwrap();
        assert_eq!(
            engine.custom_uniforms(ShaderKind::Fragment),
            vec![("gain".to_string(), Val::Int(1))]
        );
    }

    #[test]
    fn test_install_errors() {
        let mut engine = Engine::default();
        let err = engine
            .install(ShaderKind::Pixel, shader(ShaderKind::Fragment, "void main() { }"))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::KindMismatch {
                expected: ShaderKind::Pixel,
                found: ShaderKind::Fragment
            }
        );
        assert_eq!(
            engine.bind(ShaderKind::Geometry, [("gain", Val::Float(1.0))]),
            Err(EngineError::NotInstalled(ShaderKind::Geometry))
        );
        assert!(engine.custom_uniforms(ShaderKind::Geometry).is_empty());
    }

    #[test]
    fn test_disabled_stages_and_empty_arrangement() {
        let mut engine = Engine::default();
        engine
            .install(ShaderKind::Fragment, shader(ShaderKind::Fragment, HEIGHT))
            .unwrap();
        assert_eq!(engine.execute().unwrap(), Frame::default());

        engine.set_arrangement(vec![at(1.0, 1.0, 1.0)]);
        engine.set_enabled(ShaderKind::Fragment, false);
        assert!(!engine.is_enabled(ShaderKind::Fragment));
        let frame = engine.execute().unwrap();
        assert_eq!(frame.geometry.len(), 1);
        assert!(frame.fragment.is_empty());
    }
}
