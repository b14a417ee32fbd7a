use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;

/// Print a signed bearer token for local testing against the configured secret
pub fn handle(
    config: &AppConfig,
    username: String,
    name: Option<String>,
    user_id: Option<Uuid>,
    staff: bool,
) -> anyhow::Result<()> {
    let user_id = user_id.unwrap_or_else(Uuid::new_v4);
    let claims = Claims::new(
        user_id,
        username,
        name.unwrap_or_default(),
        staff,
        config.security.jwt_expiry_hours,
    );
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    eprintln!("user_id: {} (staff: {})", user_id, staff);
    println!("{}", token);
    Ok(())
}
