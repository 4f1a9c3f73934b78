use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-RoBERTa pad token id.
const PAD_ID: u32 = 1;

/// Encode `text` to fixed-length `(input_ids, attention_mask)` tensors of
/// shape `[1, max_len]`, truncating or padding as needed.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow!("tokenization failed: {e}"))?;
    let (ids, mask) = pad_or_truncate(enc.get_ids(), enc.get_attention_mask(), max_len);
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    Ok((input_ids, attention_mask))
}

fn pad_or_truncate(ids: &[u32], mask: &[u32], max_len: usize) -> (Vec<u32>, Vec<u32>) {
    let mut ids: Vec<u32> = ids.iter().copied().take(max_len).collect();
    let mut mask: Vec<u32> = mask.iter().copied().take(max_len).collect();
    ids.resize(max_len, PAD_ID);
    mask.resize(max_len, 0);
    (ids, mask)
}
