use crate::analysis::{AnalysisResult, FoodAnalyzer};
use crate::encoder::EncodedImage;
use log::{error, info, warn};
use tokio::sync::oneshot;

/// Fixed user-facing failure message. The raw cause never reaches the user;
/// it goes to the log only.
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "我们无法分析该图片。请确保这是一张清晰的食物照片，然后重试。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Analyzing,
    Success,
    Error,
}

/// The single interface state instance.
///
/// Invariants: `result` is present iff `Success`; `error_message` is present
/// iff `Error`; `preview_uri` is present for every status except `Idle`.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub status: Status,
    pub preview_uri: Option<String>,
    pub result: Option<AnalysisResult>,
    pub error_message: Option<String>,
}

impl UiState {
    pub fn idle() -> Self {
        Self {
            status: Status::Idle,
            preview_uri: None,
            result: None,
            error_message: None,
        }
    }

    pub fn invariants_hold(&self) -> bool {
        self.result.is_some() == (self.status == Status::Success)
            && self.error_message.is_some() == (self.status == Status::Error)
            && self.preview_uri.is_some() == (self.status != Status::Idle)
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Owns the [`UiState`] and sequences the single asynchronous analysis call.
/// All transitions go through the methods below; state is only touched in the
/// continuation of the call, so no transition can land out of order.
pub struct AppController {
    analyzer: Box<dyn FoodAnalyzer>,
    state: UiState,
}

impl AppController {
    pub fn new(analyzer: Box<dyn FoodAnalyzer>) -> Self {
        Self {
            analyzer,
            state: UiState::idle(),
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Runs one full Idle -> Analyzing -> Success|Error cycle. Ignored if an
    /// analysis is already in flight.
    pub async fn submit(&mut self, image: &EncodedImage) {
        self.submit_cancellable(image, None).await;
    }

    /// Like [`submit`](Self::submit), but the call can be abandoned by firing
    /// the cancel signal. Cancellation restores the Idle value. A dropped
    /// (never fired) sender does not cancel.
    pub async fn submit_cancellable(
        &mut self,
        image: &EncodedImage,
        cancel: Option<oneshot::Receiver<()>>,
    ) {
        if !self.begin_analysis(image.preview_uri.clone()) {
            warn!("Submission ignored: an analysis is already in flight");
            return;
        }

        let outcome = {
            let fut = self.analyzer.analyze(&image.base64, &image.mime_type);
            tokio::pin!(fut);
            match cancel {
                Some(mut rx) => tokio::select! {
                    res = &mut fut => Some(res),
                    sig = &mut rx => match sig {
                        Ok(()) => None,
                        // Sender dropped without signalling; keep waiting.
                        Err(_) => Some(fut.await),
                    },
                },
                None => Some(fut.await),
            }
        };

        match outcome {
            Some(Ok(result)) => {
                info!("Analysis succeeded: {}", result.food_name);
                self.finish_success(result);
            }
            Some(Err(e)) => {
                error!("Analysis failed: {}", e);
                self.finish_error();
            }
            None => {
                info!("Analysis cancelled by user");
                self.state = UiState::idle();
            }
        }
    }

    /// Returns to the Idle value. Unavailable while an analysis is in flight;
    /// a no-op when already Idle.
    pub fn reset(&mut self) {
        if self.state.status == Status::Analyzing {
            return;
        }
        self.state = UiState::idle();
    }

    /// Idle|Success|Error -> Analyzing. Refused while Analyzing so a second
    /// submission cannot perturb the pending call.
    fn begin_analysis(&mut self, preview_uri: String) -> bool {
        if self.state.status == Status::Analyzing {
            return false;
        }
        self.state = UiState {
            status: Status::Analyzing,
            preview_uri: Some(preview_uri),
            result: None,
            error_message: None,
        };
        true
    }

    fn finish_success(&mut self, result: AnalysisResult) {
        self.state.status = Status::Success;
        self.state.result = Some(result);
        self.state.error_message = None;
    }

    fn finish_error(&mut self) {
        self.state.status = Status::Error;
        self.state.result = None;
        self.state.error_message = Some(ANALYSIS_FAILED_MESSAGE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Ingredient, Macros};
    use crate::api_connection::ApiConnectionError;
    use async_trait::async_trait;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            food_name: "苹果".to_string(),
            description: "一个中等大小的苹果".to_string(),
            total_calories: 95.0,
            macros: Macros {
                protein: 0.5,
                carbs: 25.0,
                fat: 0.3,
                fiber: 4.4,
            },
            ingredients: vec![Ingredient {
                name: "苹果".to_string(),
                calories: 95.0,
            }],
            health_score: 9.0,
            health_tips: vec!["适量食用".to_string()],
        }
    }

    fn sample_image() -> EncodedImage {
        EncodedImage::from_parts(b"fake image bytes", "image/png").unwrap()
    }

    struct FixedAnalyzer(AnalysisResult);

    #[async_trait]
    impl FoodAnalyzer for FixedAnalyzer {
        async fn analyze(
            &self,
            _base64_image: &str,
            _mime_type: &str,
        ) -> Result<AnalysisResult, ApiConnectionError> {
            Ok(self.0.clone())
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl FoodAnalyzer for FailingAnalyzer {
        async fn analyze(
            &self,
            _base64_image: &str,
            _mime_type: &str,
        ) -> Result<AnalysisResult, ApiConnectionError> {
            Err(ApiConnectionError::EmptyResponse)
        }
    }

    struct NeverResolves;

    #[async_trait]
    impl FoodAnalyzer for NeverResolves {
        async fn analyze(
            &self,
            _base64_image: &str,
            _mime_type: &str,
        ) -> Result<AnalysisResult, ApiConnectionError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    #[test]
    fn idle_is_the_default_and_holds_invariants() {
        let state = UiState::default();
        assert_eq!(state, UiState::idle());
        assert_eq!(state.status, Status::Idle);
        assert!(state.invariants_hold());
    }

    #[tokio::test]
    async fn successful_submission_reaches_success() {
        let mut controller = AppController::new(Box::new(FixedAnalyzer(sample_result())));
        let image = sample_image();

        controller.submit(&image).await;

        let state = controller.state();
        assert_eq!(state.status, Status::Success);
        assert_eq!(state.preview_uri.as_deref(), Some(image.preview_uri.as_str()));
        assert_eq!(state.result.as_ref().unwrap().total_calories, 95.0);
        assert!(state.error_message.is_none());
        assert!(state.invariants_hold());
    }

    #[tokio::test]
    async fn failed_submission_reaches_error_with_fixed_message() {
        let mut controller = AppController::new(Box::new(FailingAnalyzer));
        let image = sample_image();

        controller.submit(&image).await;

        let state = controller.state();
        assert_eq!(state.status, Status::Error);
        assert_eq!(state.error_message.as_deref(), Some(ANALYSIS_FAILED_MESSAGE));
        assert!(state.result.is_none());
        assert!(state.preview_uri.is_some());
        assert!(state.invariants_hold());
    }

    #[tokio::test]
    async fn reset_from_success_restores_exact_idle_value() {
        let mut controller = AppController::new(Box::new(FixedAnalyzer(sample_result())));
        controller.submit(&sample_image()).await;
        assert_eq!(controller.state().status, Status::Success);

        controller.reset();
        assert_eq!(controller.state(), &UiState::idle());
    }

    #[tokio::test]
    async fn reset_from_error_restores_exact_idle_value() {
        let mut controller = AppController::new(Box::new(FailingAnalyzer));
        controller.submit(&sample_image()).await;
        assert_eq!(controller.state().status, Status::Error);

        controller.reset();
        assert_eq!(controller.state(), &UiState::idle());
    }

    #[tokio::test]
    async fn resubmission_after_reset_is_independent_of_prior_result() {
        let mut controller = AppController::new(Box::new(FixedAnalyzer(sample_result())));
        controller.submit(&sample_image()).await;
        controller.reset();

        controller.submit(&sample_image()).await;
        let state = controller.state();
        assert_eq!(state.status, Status::Success);
        assert_eq!(state.result.as_ref().unwrap().food_name, "苹果");
        assert!(state.invariants_hold());
    }

    #[test]
    fn second_begin_is_refused_while_analyzing() {
        let mut controller = AppController::new(Box::new(NeverResolves));
        assert!(controller.begin_analysis("data:image/png;base64,AA==".to_string()));
        let before = controller.state().clone();

        assert!(!controller.begin_analysis("data:image/png;base64,BB==".to_string()));
        assert_eq!(controller.state(), &before);
        assert_eq!(controller.state().status, Status::Analyzing);
    }

    #[test]
    fn reset_is_a_no_op_while_analyzing() {
        let mut controller = AppController::new(Box::new(NeverResolves));
        assert!(controller.begin_analysis("data:image/png;base64,AA==".to_string()));

        controller.reset();
        assert_eq!(controller.state().status, Status::Analyzing);
    }

    #[tokio::test]
    async fn cancellation_restores_idle() {
        let mut controller = AppController::new(Box::new(NeverResolves));
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();

        controller.submit_cancellable(&sample_image(), Some(rx)).await;
        assert_eq!(controller.state(), &UiState::idle());
    }

    #[tokio::test]
    async fn dropped_cancel_sender_does_not_cancel() {
        let mut controller = AppController::new(Box::new(FixedAnalyzer(sample_result())));
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);

        controller.submit_cancellable(&sample_image(), Some(rx)).await;
        assert_eq!(controller.state().status, Status::Success);
    }
}
