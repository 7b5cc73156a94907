use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use crate::models::auth::entities::{AuthContext, UserRole};

// JWT Claims 结构体（令牌由外部认证服务签发）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (user ID)
    pub role: String, // 用户角色
    pub exp: usize,   // Expiration time (时间戳)
    pub iat: usize,   // Issued at (签发时间)
}

impl Claims {
    /// 转换为业务层使用的身份上下文
    pub fn into_auth_context(self) -> Result<AuthContext> {
        if self.sub.trim().is_empty() {
            return Err(LmsError::authentication("Token subject is empty"));
        }
        let role: UserRole = self.role.parse().map_err(LmsError::authentication)?;
        Ok(AuthContext::new(self.sub, role))
    }
}

pub struct JwtUtils;

impl JwtUtils {
    // 使用全局配置验证 token
    pub fn verify_token(token: &str) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let config = &AppConfig::get().jwt;
        Self::verify_token_with_secret(token, &config.secret, config.leeway)
    }

    pub fn verify_token_with_secret(
        token: &str,
        secret: &str,
        leeway: u64,
    ) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(secret.as_ref());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway;

        decode::<Claims>(token, &decoding_key, &validation).map(|token_data| token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "unit-test-secret-unit-test-secret";

    fn generate_token_with_secret(
        user_id: &str,
        role: UserRole,
        expiry_duration: chrono::Duration,
        secret: &str,
    ) -> std::result::Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (now + expiry_duration).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
    }

    #[test]
    fn test_token_round_trip_to_auth_context() {
        let token = generate_token_with_secret(
            "u1",
            UserRole::Instructor,
            chrono::Duration::minutes(5),
            SECRET,
        )
        .unwrap();
        let auth = JwtUtils::verify_token_with_secret(&token, SECRET, 0)
            .unwrap()
            .into_auth_context()
            .unwrap();
        assert_eq!(auth, AuthContext::new("u1", UserRole::Instructor));
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired_token() {
        let token = generate_token_with_secret(
            "u1",
            UserRole::Student,
            chrono::Duration::minutes(5),
            SECRET,
        )
        .unwrap();
        assert!(JwtUtils::verify_token_with_secret(&token, "another-secret", 0).is_err());

        let expired = generate_token_with_secret(
            "u1",
            UserRole::Student,
            chrono::Duration::minutes(-10),
            SECRET,
        )
        .unwrap();
        assert!(JwtUtils::verify_token_with_secret(&expired, SECRET, 0).is_err());
        assert!(JwtUtils::verify_token_with_secret(&expired, SECRET, 3600).is_ok());
    }

    #[test]
    fn test_unknown_role_is_authentication_error() {
        let claims = Claims {
            sub: "u1".into(),
            role: "guest".into(),
            exp: 0,
            iat: 0,
        };
        let err = claims.into_auth_context().unwrap_err();
        assert_eq!(err.code(), "E010");
    }
}
