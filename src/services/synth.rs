use super::error::ServiceResult;
use super::traits::Synthesizer;

/// Leaves synthesis to the client's speech engine
#[derive(Debug, Default, Clone)]
pub struct BrowserSynthesizer;

#[async_trait::async_trait]
impl Synthesizer for BrowserSynthesizer {
    async fn synthesize(&self, _text: &str) -> ServiceResult<Option<Vec<u8>>> {
        Ok(None)
    }
}
