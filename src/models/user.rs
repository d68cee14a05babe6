//! User, profile and authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{Position, UserType};
use crate::error::AppError;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Account-level profile, exactly one per user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserProfile {
    pub user_id: i32,
    pub user_type: UserType,
    /// Customer id at the payment provider
    pub billing_id: Option<String>,
    /// Set once the payment provider confirmed a saved payment method
    pub billing_confirmed: bool,
    pub is_email_verified: bool,
}

/// Public-facing researcher details
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PersonalProfile {
    pub user_id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub institution: Option<String>,
    pub email: Option<String>,
    pub current_position: Option<Position>,
    pub cv_key: Option<String>,
    pub bio_key: Option<String>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3 to 150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub user_type: UserType,
    /// Required for publishers: name of the journal provisioned with the account
    #[validate(length(min = 1, max = 200, message = "Journal name must be 1 to 200 characters"))]
    pub journal_name: Option<String>,
}

/// Change own password
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Update own personal profile
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePersonalProfile {
    #[validate(length(max = 200))]
    pub first_name: Option<String>,
    #[validate(length(max = 200))]
    pub last_name: Option<String>,
    #[validate(length(max = 200))]
    pub institution: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub current_position: Option<Position>,
}

/// Documents attached to a personal profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProfileDocument {
    Cv,
    Bio,
}

impl ProfileDocument {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileDocument::Cv => "cv",
            ProfileDocument::Bio => "bio",
        }
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub user_type: UserType,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn require_researcher(&self) -> Result<(), AppError> {
        if self.user_type == UserType::Researcher {
            Ok(())
        } else {
            Err(AppError::Authorization("Researcher account required".to_string()))
        }
    }

    pub fn require_publisher(&self) -> Result<(), AppError> {
        if self.user_type == UserType::Publisher {
            Ok(())
        } else {
            Err(AppError::Authorization("Publisher account required".to_string()))
        }
    }

    /// Publisher or editor, i.e. someone acting on behalf of a journal
    pub fn require_journal_staff(&self) -> Result<(), AppError> {
        match self.user_type {
            UserType::Publisher | UserType::Editor => Ok(()),
            UserType::Researcher => Err(AppError::Authorization(
                "Publisher or editor account required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(user_type: UserType) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "alice".to_string(),
            user_id: 7,
            user_type,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = claims(UserType::Editor).create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.user_type, UserType::Editor);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_role_checks() {
        assert!(claims(UserType::Researcher).require_researcher().is_ok());
        assert!(claims(UserType::Researcher).require_journal_staff().is_err());
        assert!(claims(UserType::Editor).require_journal_staff().is_ok());
        assert!(claims(UserType::Editor).require_publisher().is_err());
    }

    #[test]
    fn test_create_user_validation() {
        let request = CreateUser {
            username: "al".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            user_type: UserType::Researcher,
            journal_name: None,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
