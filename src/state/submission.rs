use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::hunt::answers_match;
use crate::types::*;
use crate::upload::ImageUpload;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReviewError {
    #[error("Admin comment is required")]
    EmptyComment,

    #[error("A review cannot be withdrawn")]
    Withdrawal,

    #[error("Submission has already been reviewed")]
    AlreadyReviewed,
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::EmptyComment | ReviewError::Withdrawal => {
                ApiError::BadRequest(err.to_string())
            }
            ReviewError::AlreadyReviewed => ApiError::Conflict(err.to_string()),
        }
    }
}

impl Submission {
    /// Mark reviewed with the admin's comment. One-way: a reviewed
    /// submission cannot be reviewed again or un-reviewed.
    pub fn review(&mut self, comment: &str, reviewed: bool) -> Result<(), ReviewError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        if !reviewed {
            return Err(ReviewError::Withdrawal);
        }
        if self.reviewed {
            return Err(ReviewError::AlreadyReviewed);
        }
        self.admin_comment = Some(comment.to_string());
        self.reviewed = true;
        Ok(())
    }
}

impl AppState {
    /// Store a photo submission. Correctness is recomputed against the
    /// stored answer; whatever the client believes is ignored.
    pub async fn submit_proof(
        &self,
        user_id: UserId,
        location_id: LocationId,
        answer: &str,
        image: &ImageUpload,
    ) -> ApiResult<Submission> {
        // Check the image before touching the store so bad uploads leave nothing behind
        self.uploads.validate(image)?;

        let location = self
            .store
            .get_location(location_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;
        let correct_answer = answers_match(answer, &location.answer);
        let image_url = self.uploads.save(image).await?;

        let submission = self
            .store
            .create_submission(NewSubmission {
                user_id,
                location_id,
                image_url,
                answer: answer.to_string(),
                correct_answer,
            })
            .await?;

        tracing::info!(
            submission_id = submission.id,
            user_id,
            location_id,
            correct_answer,
            "Submission received"
        );
        Ok(submission)
    }

    /// Admin review of a submission
    pub async fn review_submission(
        &self,
        submission_id: SubmissionId,
        comment: &str,
        reviewed: bool,
    ) -> ApiResult<Submission> {
        let mut submission = self
            .store
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

        submission.review(comment, reviewed)?;

        let updated = self
            .store
            .update_submission(submission)
            .await?
            .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
        tracing::info!(submission_id, "Submission reviewed");
        Ok(updated)
    }
}
