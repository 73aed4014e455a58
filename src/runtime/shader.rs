//! Артефакт скомпилированного шейдера.
//!
//! Набор uniform фиксируется при генерации кода: привязка неизвестного имени
//! является ошибкой, а не расширением объекта. Пользовательские uniform
//! получают значения по умолчанию, встроенные и выходные остаются
//! неустановленными, пока их не привяжет движок или не запишет сам шейдер.

use std::collections::{BTreeSet, HashMap};

use log::trace;

use crate::compiler::ShaderKind;
use crate::types::Type;

use super::code::{CompiledFunction, Evaluator};
use super::value::Val;
use super::{RuntimeError, RuntimeResult};

/// Описание слота uniform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub ty: Type,
    /// Встроенный uniform (вход или выход стадии) привязывается движком
    /// каждый такт и не переносится при горячей замене.
    pub builtin: bool,
}

/// Скомпилированный шейдер, готовый к запуску.
#[derive(Debug, Clone)]
pub struct Shader {
    kind: ShaderKind,
    slots: Vec<UniformSlot>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    state: Vec<Option<Val>>,
    outputs: Vec<usize>,
    functions: Vec<CompiledFunction>,
    entry: usize,
}

impl Shader {
    /// Собрать шейдер из слотов и понижённых функций. `entry` - индекс
    /// `void main()` в `functions`.
    pub fn new(
        kind: ShaderKind,
        slots: Vec<UniformSlot>,
        functions: Vec<CompiledFunction>,
        entry: usize,
    ) -> Self {
        let names: Vec<String> = slots.iter().map(|s| s.name.clone()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect::<HashMap<_, _>>();
        let state = slots
            .iter()
            .map(|slot| if slot.builtin { None } else { Val::default_for(slot.ty) })
            .collect();
        let outputs = kind
            .outputs()
            .iter()
            .filter_map(|name| index.get(*name).copied())
            .collect();

        Self {
            kind,
            slots,
            names,
            index,
            state,
            outputs,
            functions,
            entry,
        }
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    pub fn functions(&self) -> &[CompiledFunction] {
        &self.functions
    }

    /// Имена всех uniform шейдера.
    pub fn known_uniforms(&self) -> BTreeSet<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    pub fn uniform_type(&self, name: &str) -> Option<Type> {
        self.index.get(name).map(|i| self.slots[*i].ty)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.index.get(name).is_some_and(|i| self.slots[*i].builtin)
    }

    /// Текущее значение uniform (`None`, если не установлено).
    pub fn uniform(&self, name: &str) -> Option<&Val> {
        self.index.get(name).and_then(|i| self.state[*i].as_ref())
    }

    /// Привязать значения по именам. Набор проверяется целиком до записи:
    /// при ошибке состояние шейдера не меняется.
    pub fn bind<I, S>(&mut self, pairs: I) -> RuntimeResult<()>
    where
        I: IntoIterator<Item = (S, Val)>,
        S: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for (name, value) in pairs {
            let name = name.as_ref();
            let slot = self.slot_for(name, &value)?;
            resolved.push((slot, value));
        }
        for (slot, value) in resolved {
            self.state[slot] = Some(value);
        }
        Ok(())
    }

    /// Привязать одно значение.
    pub fn bind_one(&mut self, name: &str, value: Val) -> RuntimeResult<()> {
        let slot = self.slot_for(name, &value)?;
        self.state[slot] = Some(value);
        Ok(())
    }

    fn slot_for(&self, name: &str, value: &Val) -> RuntimeResult<usize> {
        let slot = *self
            .index
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownUniform(name.to_string()))?;
        let expected = self.slots[slot].ty;
        if value.ty() != expected {
            return Err(RuntimeError::UniformTypeMismatch {
                name: name.to_string(),
                expected,
                found: value.ty(),
            });
        }
        Ok(slot)
    }

    /// Установленные значения пользовательских uniform (встроенные исключены).
    pub fn custom_uniforms(&self) -> Vec<(String, Val)> {
        self.slots
            .iter()
            .zip(&self.state)
            .filter(|(slot, _)| !slot.builtin)
            .filter_map(|(slot, value)| value.map(|v| (slot.name.clone(), v)))
            .collect()
    }

    /// Выполнить `main`. Выходные переменные сбрасываются перед запуском.
    pub fn run(&mut self) -> RuntimeResult<()> {
        for output in &self.outputs {
            self.state[*output] = None;
        }
        trace!("running {} shader", self.kind);
        let mut evaluator = Evaluator {
            functions: &self.functions,
            uniforms: &mut self.state,
            uniform_names: &self.names,
        };
        evaluator.call(self.entry, Vec::new())?;
        Ok(())
    }

    /// Первая выходная переменная, которую последний запуск не установил.
    pub fn missing_output(&self) -> Option<&'static str> {
        self.kind
            .outputs()
            .iter()
            .copied()
            .find(|name| self.uniform(name).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{Backend, LowerBackend};
    use crate::compiler::compile;
    use crate::parser::parse;

    fn shader(kind: ShaderKind, source: &str) -> Shader {
        let ast = parse(source).unwrap();
        let program = compile(&ast, kind).unwrap();
        LowerBackend.generate(&program).unwrap()
    }

    #[test]
    fn test_known_uniforms_and_defaults() {
        let s = shader(
            ShaderKind::Fragment,
            "uniform float customGain; uniform int steps; uniform vec2 offset; void main() { }",
        );
        let known = s.known_uniforms();
        for name in ["customGain", "steps", "offset", "iGlobalTime", "sd_FragHeight"] {
            assert!(known.contains(name), "{name}");
        }
        assert_eq!(s.uniform_type("offset"), Some(Type::Vec2));
        assert_eq!(s.uniform("customGain"), Some(&Val::Float(1.0)));
        assert_eq!(s.uniform("steps"), Some(&Val::Int(1)));
        assert_eq!(s.uniform("offset"), Some(&Val::Vec2([0.0, 0.0])));
        assert_eq!(s.uniform("iGlobalTime"), None);
        assert!(s.is_builtin("iGlobalTime"));
        assert!(!s.is_builtin("customGain"));
    }

    #[test]
    fn test_bind_errors() {
        let mut s = shader(ShaderKind::Fragment, "uniform float gain; void main() { }");
        assert_eq!(
            s.bind([("nope", Val::Float(1.0))]),
            Err(RuntimeError::UnknownUniform("nope".to_string()))
        );
        assert!(matches!(
            s.bind([("gain", Val::Int(1))]),
            Err(RuntimeError::UniformTypeMismatch { .. })
        ));
        // частичная привязка не применяется
        assert!(s.bind([("gain", Val::Float(0.5)), ("nope", Val::Float(1.0))]).is_err());
        assert_eq!(s.uniform("gain"), Some(&Val::Float(1.0)));
        s.bind([("gain", Val::Float(0.5))]).unwrap();
        assert_eq!(s.custom_uniforms(), vec![("gain".to_string(), Val::Float(0.5))]);
    }

    #[test]
    fn test_run_sets_outputs() {
        let mut s = shader(
            ShaderKind::Fragment,
            "uniform float gain;
             float twice(float x) { return x * 2.0; }
             void main() {
                 sd_FragHeight = twice(gain) + iFragCoord.y;
                 sd_FragAngle = 0.25;
             }",
        );
        s.bind([
            ("gain", Val::Float(0.5)),
            ("iFragCoord", Val::Vec3([0.0, 3.0, 0.0])),
            ("iFragNormal", Val::Vec3([0.0, 1.0, 0.0])),
            ("iGlobalTime", Val::Float(0.0)),
        ])
        .unwrap();
        s.run().unwrap();
        assert_eq!(s.uniform("sd_FragHeight"), Some(&Val::Float(4.0)));
        assert_eq!(s.uniform("sd_FragAngle"), Some(&Val::Float(0.25)));
        assert_eq!(s.missing_output(), None);
    }

    #[test]
    fn test_outputs_reset_between_runs() {
        let mut s = shader(
            ShaderKind::Fragment,
            "uniform int mode; void main() { if (mode == 1) { sd_FragHeight = 1.0; sd_FragAngle = 0.0; } }",
        );
        s.run().unwrap();
        assert_eq!(s.missing_output(), None);
        s.bind([("mode", Val::Int(0))]).unwrap();
        s.run().unwrap();
        assert_eq!(s.missing_output(), Some("sd_FragHeight"));
    }

    #[test]
    fn test_loops_and_control_flow() {
        let mut s = shader(
            ShaderKind::Fragment,
            "int sum(int n) {
                 int total = 0;
                 for (int i = 1; i <= n; i++) { total = total + i; }
                 return total;
             }
             void main() {
                 int k = 0;
                 while (k < 3) { k++; }
                 sd_FragHeight = float(sum(4) * k);
                 if (k != 3) { sd_FragAngle = 1.0; } else { sd_FragAngle = -1.0; }
             }",
        );
        s.run().unwrap();
        assert_eq!(s.uniform("sd_FragHeight"), Some(&Val::Float(30.0)));
        assert_eq!(s.uniform("sd_FragAngle"), Some(&Val::Float(-1.0)));
    }

    #[test]
    fn test_runtime_faults() {
        let mut s = shader(
            ShaderKind::Fragment,
            "uniform int divisor; void main() { int x = 10 / (divisor - 1); sd_FragHeight = 1.0; sd_FragAngle = 1.0; }",
        );
        assert_eq!(s.run(), Err(RuntimeError::DivisionByZero));

        let mut s = shader(
            ShaderKind::Fragment,
            "float f(float x) { if (x > 0.0) { return x; } } void main() { sd_FragHeight = f(-1.0); }",
        );
        assert_eq!(s.run(), Err(RuntimeError::MissingReturn("f".to_string())));

        let mut s = shader(ShaderKind::Fragment, "void main() { float h = sd_FragHeight; }");
        assert_eq!(s.run(), Err(RuntimeError::Unset("sd_FragHeight".to_string())));
    }

    #[test]
    fn test_deterministic_runs() {
        let mut s = shader(
            ShaderKind::Pixel,
            "uniform float gain;
             void main() {
                 vec2 uv = iPixelCoord / iPixelResolution.x;
                 float wave = sin(iGlobalTime * 3.0 + uv.y) * gain;
                 sd_PixelColor = vec4(abs(uv), wave, 1.0);
             }",
        );
        let inputs = [
            ("gain", Val::Float(0.7)),
            ("iGlobalTime", Val::Float(1.25)),
            ("iFragCoord", Val::Vec3([1.0, 2.0, 3.0])),
            ("iFragNormal", Val::Vec3([0.0, 1.0, 0.0])),
            ("iPixelCoord", Val::Vec2([1.0, 0.0])),
            ("iPixelResolution", Val::Vec2([2.0, 1.0])),
        ];
        s.bind(inputs).unwrap();
        s.run().unwrap();
        let first = *s.uniform("sd_PixelColor").unwrap();
        s.bind(inputs).unwrap();
        s.run().unwrap();
        let second = *s.uniform("sd_PixelColor").unwrap();
        let bits = |v: Val| match v {
            Val::Vec4(c) => c.map(f64::to_bits),
            other => panic!("unexpected {other}"),
        };
        assert_eq!(bits(first), bits(second));
    }
}
