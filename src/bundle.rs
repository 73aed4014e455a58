//! Наборы шейдеров.
//!
//! Набор - каталог или ZIP-архив с файлами `<вид>.<расширение>`, например
//! `geometry.nlsl`, `fragment.nlsl`, `pixel.nlsl`. Каждый найденный вид
//! компилируется и устанавливается в движок; отсутствующие виды оставляют
//! стадию пустой. Файлы с другими именами пропускаются.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;
use zip::ZipArchive;

use crate::compiler::ShaderKind;
use crate::engine::{DeviceProfile, Engine, EngineError};
use crate::runtime::Shader;
use crate::service::{compile_request, CompileFailure};

/// Ошибка загрузки набора.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("entry '{0}' is not valid UTF-8")]
    Encoding(String),

    #[error("more than one {0} shader in bundle")]
    Duplicate(ShaderKind),

    #[error("{kind} shader: {failure}")]
    Compile {
        kind: ShaderKind,
        failure: CompileFailure,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Исходники шейдеров по видам.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    sources: BTreeMap<ShaderKind, String>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Открыть каталог или ZIP-архив.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BundleError> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            let file = fs::File::open(path).map_err(|source| BundleError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_zip(file)
        }
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, BundleError> {
        let dir = dir.as_ref();
        let io = |source| BundleError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut bundle = Self::new();
        for entry in fs::read_dir(dir).map_err(io)? {
            let path = entry.map_err(io)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(kind) = entry_kind(&path.to_string_lossy()) else {
                debug!("skipping {}", path.display());
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|source| BundleError::Io {
                path: path.clone(),
                source,
            })?;
            bundle.insert(kind, source)?;
        }
        debug!("loaded bundle from {}: {:?}", dir.display(), bundle.kinds());
        Ok(bundle)
    }

    pub fn from_zip<R: Read + Seek>(reader: R) -> Result<Self, BundleError> {
        let mut archive = ZipArchive::new(reader).map_err(|e| BundleError::Archive(e.to_string()))?;

        let mut bundle = Self::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| BundleError::Archive(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let Some(kind) = entry_kind(&name) else {
                debug!("skipping archive entry {name}");
                continue;
            };
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .map_err(|e| BundleError::Archive(e.to_string()))?;
            let source = String::from_utf8(bytes).map_err(|_| BundleError::Encoding(name))?;
            bundle.insert(kind, source)?;
        }
        debug!("loaded bundle from archive: {:?}", bundle.kinds());
        Ok(bundle)
    }

    /// Добавить исходник; второй исходник того же вида - ошибка.
    pub fn insert(&mut self, kind: ShaderKind, source: String) -> Result<(), BundleError> {
        if self.sources.contains_key(&kind) {
            return Err(BundleError::Duplicate(kind));
        }
        self.sources.insert(kind, source);
        Ok(())
    }

    pub fn source(&self, kind: ShaderKind) -> Option<&str> {
        self.sources.get(&kind).map(String::as_str)
    }

    pub fn kinds(&self) -> Vec<ShaderKind> {
        self.sources.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Скомпилировать один вид.
    pub fn load(&self, kind: ShaderKind) -> Option<Result<Shader, BundleError>> {
        self.source(kind).map(|source| {
            compile_request(kind, source).map_err(|failure| BundleError::Compile { kind, failure })
        })
    }

    /// Скомпилировать все исходники и установить их в новый движок.
    pub fn build_engine(&self, profile: DeviceProfile) -> Result<Engine, BundleError> {
        let mut engine = Engine::new(profile);
        for kind in ShaderKind::ALL {
            if let Some(shader) = self.load(kind).transpose()? {
                engine.install(kind, shader)?;
            }
        }
        Ok(engine)
    }
}

/// Вид шейдера по имени файла: часть имени до первой точки.
fn entry_kind(path: &str) -> Option<ShaderKind> {
    let file_name = path.rsplit(['/', '\\']).next()?;
    let stem = file_name.split('.').next()?;
    stem.parse().ok()
}
