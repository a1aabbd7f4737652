use actix_web::{dev::ServiceRequest, error::ErrorUnauthorized, web, Error};
use actix_web_httpauth::extractors::basic::BasicAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::state::AppState;

/// Admin credentials come from the environment; the password is hashed once
/// at startup so the plaintext is not kept around for the process lifetime.
#[derive(Clone, Debug)]
pub struct AdminAuth {
    user: String,
    password_hash: String,
}

impl AdminAuth {
    pub fn new(user: &str, password: &str) -> Result<Self, password_hash::Error> {
        Ok(Self {
            user: user.to_string(),
            password_hash: hash_password(password)?,
        })
    }

    pub fn check(&self, user: &str, password: &str) -> bool {
        self.user == user && verify_password(password, &self.password_hash)
    }
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        return Err((ErrorUnauthorized("Unauthorized"), req));
    };

    let user = credentials.user_id();
    let password = credentials.password().unwrap_or_default();
    if state.admin.check(user, password) {
        Ok(req)
    } else {
        Err((ErrorUnauthorized("Unauthorized"), req))
    }
}
