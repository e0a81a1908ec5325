use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Star rating a student leaves on a course.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub course_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review joined with the author's display name, for public listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ReviewWithAuthor {
    pub id: i32,
    pub course_id: i32,
    pub user_id: i32,
    pub author_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn rating_bounds_enforced() {
        let too_low = CreateReviewDto {
            rating: 0,
            comment: None,
        };
        let too_high = CreateReviewDto {
            rating: 6,
            comment: None,
        };
        let ok = CreateReviewDto {
            rating: 5,
            comment: Some("Great course".into()),
        };
        assert!(too_low.validate().is_err());
        assert!(too_high.validate().is_err());
        assert!(ok.validate().is_ok());
    }
}
