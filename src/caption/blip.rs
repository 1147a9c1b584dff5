use super::{CaptionModelVariant, CaptionService};
use crate::{Error, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::blip;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;

/// Square input resolution expected by the BLIP vision encoder.
pub const IMAGE_SIZE: u32 = 384;

/// Generation length limit, counted including the leading BOS token.
const MAX_LENGTH: usize = 20;

/// Upper bound on generated caption tokens; this also bounds the caption
/// forwarded to the nutrition service.
pub const MAX_CAPTION_TOKENS: usize = MAX_LENGTH - 1;

const BOS_TOKEN_ID: u32 = 30522;
const SEP_TOKEN_ID: u32 = 102;

const IMAGE_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const IMAGE_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// BLIP captioner whose weights and tokenizer are loaded once and reused.
///
/// The text decoder keeps a KV cache and needs `&mut` access while
/// generating, so the model sits behind a mutex. Requests are sequential, so
/// the lock is never contended.
pub struct BlipCaptioner {
    model: Arc<Mutex<blip::BlipForConditionalGeneration>>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    variant: CaptionModelVariant,
}

impl std::fmt::Debug for BlipCaptioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipCaptioner")
            .field("variant", &self.variant)
            .field("device", &self.device)
            .finish()
    }
}

impl BlipCaptioner {
    /// Fetch the checkpoint from the Hugging Face hub (or its local cache) and
    /// load it onto the CPU.
    pub async fn load(variant: CaptionModelVariant) -> Result<Self> {
        tracing::info!(
            "Loading BLIP captioning model {} (only once)",
            variant.repo_id()
        );

        let api = hf_hub::api::tokio::Api::new()
            .map_err(|e| Error::ModelLoad(format!("Failed to initialize hub client: {}", e)))?;
        let repo = api.model(variant.repo_id().to_string());

        let weights = repo.get("model.safetensors").await.map_err(|e| {
            Error::ModelLoad(format!(
                "Failed to fetch weights for {}: {}",
                variant.repo_id(),
                e
            ))
        })?;
        let tokenizer = repo.get("tokenizer.json").await.map_err(|e| {
            Error::ModelLoad(format!(
                "Failed to fetch tokenizer for {}: {}",
                variant.repo_id(),
                e
            ))
        })?;

        Self::from_files(variant, &weights, &tokenizer, Device::Cpu)
    }

    /// Load from already-downloaded safetensors weights and tokenizer files.
    pub fn from_files(
        variant: CaptionModelVariant,
        weights: &Path,
        tokenizer: &Path,
        device: Device,
    ) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(tokenizer)
            .map_err(|e| Error::ModelLoad(format!("Failed to load tokenizer: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device).map_err(|e| {
                Error::ModelLoad(format!(
                    "Failed to map safetensors {}: {}",
                    weights.display(),
                    e
                ))
            })?
        };

        let model = blip::BlipForConditionalGeneration::new(&model_config(variant), vb)
            .map_err(|e| Error::ModelLoad(format!("Failed to build BLIP model: {}", e)))?;

        tracing::info!("BLIP {} model ready on {:?}", variant, device);

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            tokenizer: Arc::new(tokenizer),
            device,
            variant,
        })
    }

    pub fn variant(&self) -> CaptionModelVariant {
        self.variant
    }
}

/// Architecture of each checkpoint. Candle ships the large configuration; the
/// base checkpoint shares the text decoder but has a narrower ViT-B/16 vision
/// encoder.
pub fn model_config(variant: CaptionModelVariant) -> blip::Config {
    let mut config = blip::Config::image_captioning_large();
    if variant == CaptionModelVariant::Base {
        config.vision_config.hidden_size = 768;
        config.vision_config.intermediate_size = 3072;
        config.vision_config.num_hidden_layers = 12;
        config.vision_config.num_attention_heads = 12;
        config.text_config.encoder_hidden_size = 768;
    }
    config
}

/// Convert any decoded image into the normalized `(3, 384, 384)` tensor the
/// vision encoder expects.
pub fn image_to_tensor(image: &DynamicImage, device: &Device) -> Result<Tensor> {
    let side = IMAGE_SIZE as usize;
    let rgb = image
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::CatmullRom)
        .to_rgb8();

    let pixels = Tensor::from_vec(rgb.into_raw(), (side, side, 3), device)?.permute((2, 0, 1))?;
    let mean = Tensor::new(&IMAGE_MEAN, device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGE_STD, device)?.reshape((3, 1, 1))?;

    Ok((pixels.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)?)
}

/// Greedy decoding: always take the most likely next token, so the same image
/// yields the same caption.
fn generate_tokens(
    model: &mut blip::BlipForConditionalGeneration,
    pixels: &Tensor,
    device: &Device,
) -> Result<Vec<u32>> {
    model.reset_kv_cache();
    let image_embeds = pixels.unsqueeze(0)?.apply(model.vision_model())?;

    let mut token_ids = vec![BOS_TOKEN_ID];
    for index in 0..MAX_CAPTION_TOKENS {
        let context_size = if index > 0 { 1 } else { token_ids.len() };
        let start_pos = token_ids.len().saturating_sub(context_size);
        let input_ids = Tensor::new(&token_ids[start_pos..], device)?.unsqueeze(0)?;

        let logits = model
            .text_decoder()
            .forward(&input_ids, &image_embeds)?
            .squeeze(0)?;
        let logits = logits.get(logits.dim(0)? - 1)?;
        let token = logits.argmax(D::Minus1)?.to_scalar::<u32>()?;

        if token == SEP_TOKEN_ID {
            break;
        }
        token_ids.push(token);
    }

    Ok(token_ids.split_off(1))
}

fn decode_caption(tokenizer: &Tokenizer, token_ids: &[u32]) -> Result<String> {
    let text = tokenizer
        .decode(token_ids, true)
        .map_err(|e| Error::Caption(format!("Failed to decode caption tokens: {}", e)))?;
    Ok(finish_caption(&text))
}

/// Final caption text: surrounding whitespace removed, nothing else touched.
pub fn finish_caption(decoded: &str) -> String {
    decoded.trim().to_string()
}

#[async_trait]
impl CaptionService for BlipCaptioner {
    async fn caption(&self, image: DynamicImage) -> Result<String> {
        let model = Arc::clone(&self.model);
        let tokenizer = Arc::clone(&self.tokenizer);
        let device = self.device.clone();

        tokio::task::spawn_blocking(move || {
            let pixels = image_to_tensor(&image, &device)?;
            let token_ids = {
                let mut model = model
                    .lock()
                    .map_err(|e| Error::Caption(format!("Model mutex poisoned: {}", e)))?;
                generate_tokens(&mut model, &pixels, &device)?
            };
            tracing::debug!("Generated {} caption tokens", token_ids.len());
            decode_caption(&tokenizer, &token_ids)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Captioning task join error: {}", e)))?
    }
}
