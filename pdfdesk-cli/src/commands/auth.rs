use crate::console::read_password;
use crate::context::Context;
use pdfdesk_core::session::AuthService;

pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    let user = AuthService::new(ctx.client.clone()).login(email, &password).await?;
    println!("Signed in as {} ({})", user.email, user.role);
    Ok(())
}

pub async fn logout(ctx: &Context) -> anyhow::Result<()> {
    AuthService::new(ctx.client.clone()).logout().await?;
    println!("Signed out");
    Ok(())
}
