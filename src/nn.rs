//! ONNX model loading and inference.
//!
//! Both learned components of the pipeline — the hand-landmark network and the sign classifier —
//! are persisted as ONNX files and executed on the CPU through [`tract_onnx`].

use std::path::Path;
use std::sync::Arc;

use tract_onnx::prelude::{
    tvec, Framework, Graph, InferenceModelExt, SimplePlan, TValue, TVec, Tensor, TypedFact,
    TypedOp,
};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// The tensors produced by one inference pass, in output-node order.
pub type Outputs = TVec<TValue>;

/// Describes in what order a network expects its input image data.
///
/// - `N` is the number of images, fixed at 1 here.
/// - `C` is the number of color channels, 3 for RGB inputs.
/// - `H` and `W` are the height and width of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// Shape is `[N, C, H, W]`.
    Nchw,
    /// Shape is `[N, H, W, C]`.
    Nhwc,
}

/// An optimized, runnable ONNX model.
#[derive(Debug)]
pub struct Model {
    plan: Plan,
}

impl Model {
    /// Loads and optimizes a model from an ONNX file path.
    ///
    /// The path must have a `.onnx` extension. Returns an error if the model data is malformed or
    /// uses unimplemented operations.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match path.extension() {
            Some(ext) if ext == "onnx" => {}
            _ => anyhow::bail!("model file must have `.onnx` extension: {}", path.display()),
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)?
            .into_optimized()?
            .into_runnable()?;
        log::debug!("loaded model {}", path.display());
        Ok(Self { plan })
    }

    /// Returns the concrete shape of the model's single input.
    pub fn input_shape(&self) -> anyhow::Result<Vec<usize>> {
        anyhow::ensure!(
            self.plan.model().inputs.len() == 1,
            "model must take exactly 1 input, this one takes {}",
            self.plan.model().inputs.len(),
        );
        let fact = self.plan.model().input_fact(0)?;
        let shape = fact
            .shape
            .as_concrete()
            .ok_or_else(|| anyhow::anyhow!("model input has a symbolic shape"))?;
        Ok(shape.to_vec())
    }

    /// Interprets the input shape as an image tensor, returning the layout and input width/height.
    pub fn image_input_layout(&self) -> anyhow::Result<(InputLayout, usize, usize)> {
        let shape = self.input_shape()?;
        match shape.as_slice() {
            [1, 3, h, w] => Ok((InputLayout::Nchw, *w, *h)),
            [1, h, w, 3] => Ok((InputLayout::Nhwc, *w, *h)),
            _ => anyhow::bail!("invalid image input shape: {:?}", shape),
        }
    }

    /// Runs the model on a single input tensor, returning all output tensors.
    pub fn run(&self, input: Tensor) -> anyhow::Result<Outputs> {
        let outputs = self.plan.run(tvec![TValue::from_const(Arc::new(input))])?;
        Ok(outputs)
    }
}
