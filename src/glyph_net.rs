use std::path::PathBuf;

use float_ord::FloatOrd;
use image::{imageops::FilterType, DynamicImage, Pixel, Rgb};
use ndarray::{Array3, Axis};
use ort::{inputs, ExecutionProviderDispatch, GraphOptimizationLevel, Session};
use tracing::instrument;

use crate::{label::GlyphClassifier, Error, Result};

const MEAN_VALUES: [f32; 3] = [0.5, 0.5, 0.5];
const NORM_VALUES: [f32; 3] = [2.0, 2.0, 2.0];

pub const DEFAULT_INPUT_WIDTH: u32 = 24;
pub const DEFAULT_INPUT_HEIGHT: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Default,
    #[cfg(feature = "tensorrt")]
    TensorRT,
    #[cfg(feature = "coreml")]
    CoreML,
    #[cfg(feature = "cuda")]
    Cuda,
    #[cfg(feature = "directml")]
    DirectML,
}

pub const DEFAULT_PROVIDERS: &[ExecutionProvider] = &[
    #[cfg(feature = "tensorrt")]
    ExecutionProvider::TensorRT,
    #[cfg(feature = "coreml")]
    ExecutionProvider::CoreML,
    #[cfg(feature = "directml")]
    ExecutionProvider::DirectML,
    #[cfg(feature = "cuda")]
    ExecutionProvider::Cuda,
    ExecutionProvider::Default,
];

#[cfg(feature = "tensorrt")]
fn setup_tensorrt(cache_path: PathBuf, width: u32, height: u32) -> ExecutionProviderDispatch {
    use ort::TensorRTExecutionProvider;

    TensorRTExecutionProvider::default()
        .with_profile_min_shapes(format!("x:1x3x{height}x{width}"))
        .with_profile_max_shapes(format!("x:1x3x{height}x{width}"))
        .with_profile_opt_shapes(format!("x:1x3x{height}x{width}"))
        .with_engine_cache(true)
        .with_engine_cache_path(cache_path.to_string_lossy())
        .with_timing_cache(true)
        .with_builder_optimization_level(5)
        .build()
}

#[cfg(feature = "cuda")]
fn setup_cuda() -> ExecutionProviderDispatch {
    use ort::CUDAExecutionProvider;

    CUDAExecutionProvider::default().build()
}

#[cfg(feature = "coreml")]
fn setup_coreml() -> ExecutionProviderDispatch {
    use ort::CoreMLExecutionProvider;

    CoreMLExecutionProvider::default().build()
}

#[cfg(feature = "directml")]
fn setup_directml() -> ExecutionProviderDispatch {
    use ort::DirectMLExecutionProvider;

    DirectMLExecutionProvider::default().build()
}

fn subtract_mean_normalize(image: &DynamicImage) -> Array3<f32> {
    let mut image = image.to_rgb32f();
    let norm = Rgb::<f32>(NORM_VALUES);
    let mean_vals = Rgb::<f32>(MEAN_VALUES).map2(&norm, |c1, c2| c1 * c2);
    for pixel in image.pixels_mut() {
        *pixel = pixel
            .map2(&norm, |c1, c2| c1 * c2)
            .map2(&mean_vals, |c1, c2| c1 - c2);
    }
    Array3::<f32>::from_shape_fn(
        (3, image.height() as usize, image.width() as usize),
        |(ch, y, x)| image.get_pixel(x as u32, y as u32).channels()[ch],
    )
}

/// Single glyph recognition model, one class score per line of the keys file.
pub struct GlyphNet {
    session: Session,
    keys: Vec<String>,
    input_width: u32,
    input_height: u32,
    min_score: f32,
}

impl GlyphNet {
    #[instrument(level = "debug")]
    pub fn init(
        model_path: PathBuf,
        keys_path: PathBuf,
        num_threads: usize,
        execution_providers: &[ExecutionProvider],
        cache_path: Option<PathBuf>,
    ) -> Result<Self> {
        #[cfg(feature = "directml")]
        let parallel = !execution_providers.contains(&ExecutionProvider::DirectML);
        #[cfg(not(feature = "directml"))]
        let parallel = true;

        let execution_providers = execution_providers.iter().filter_map(
            |provider| -> Option<ExecutionProviderDispatch> {
                match provider {
                    ExecutionProvider::Default => None,
                    #[cfg(feature = "tensorrt")]
                    ExecutionProvider::TensorRT => Some(setup_tensorrt(
                        cache_path.clone().unwrap_or_else(|| {
                            model_path
                                .parent()
                                .map(|parent| parent.join(".cache"))
                                .unwrap_or_else(|| PathBuf::from(".cache"))
                        }),
                        DEFAULT_INPUT_WIDTH,
                        DEFAULT_INPUT_HEIGHT,
                    )),
                    #[cfg(feature = "cuda")]
                    ExecutionProvider::Cuda => Some(setup_cuda()),
                    #[cfg(feature = "coreml")]
                    ExecutionProvider::CoreML => Some(setup_coreml()),
                    #[cfg(feature = "directml")]
                    ExecutionProvider::DirectML => Some(setup_directml()),
                }
            },
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_parallel_execution(parallel)?
            .with_inter_threads(num_threads)?
            .with_intra_threads(num_threads)?
            .with_execution_providers(execution_providers)?
            .commit_from_file(model_path)?;

        let keys = std::fs::read_to_string(&keys_path).map_err(|source| Error::Keys {
            path: keys_path,
            source,
        })?;
        let keys = keys.lines().map(|line| line.to_string()).collect();

        log::debug!("Glyph session inputs: {:?}", session.inputs);
        log::debug!("Glyph session outputs: {:?}", session.outputs);

        Ok(Self {
            session,
            keys,
            input_width: DEFAULT_INPUT_WIDTH,
            input_height: DEFAULT_INPUT_HEIGHT,
            min_score: 0.0,
        })
    }

    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_width = width;
        self.input_height = height;
        self
    }

    /// Glyphs scoring below `min_score` are reported as unrecognised.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    #[instrument(level = "trace", skip(self, image))]
    fn get_glyph(&self, image: &DynamicImage) -> Result<Option<(usize, f32)>> {
        let image =
            image.resize_exact(self.input_width, self.input_height, FilterType::Triangle);
        let tensor_values = subtract_mean_normalize(&image).insert_axis(Axis(0));
        let outputs = self.session.run(inputs!["x" => tensor_values]?)?;
        let Some((_, output)) = outputs.first_key_value() else {
            return Ok(None);
        };
        let scores = output.try_extract_tensor::<f32>()?;

        Ok(scores
            .iter()
            .enumerate()
            .max_by_key(|(_, score)| FloatOrd(**score))
            .map(|(index, score)| (index, *score)))
    }
}

impl GlyphClassifier for GlyphNet {
    fn classify(&self, glyph: &DynamicImage) -> Result<String> {
        let text = match self.get_glyph(glyph)? {
            Some((index, score)) if score >= self.min_score => {
                self.keys.get(index).cloned().unwrap_or_default()
            }
            _ => String::new(),
        };
        Ok(text)
    }
}
