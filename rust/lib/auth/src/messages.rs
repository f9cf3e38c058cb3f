//! User-facing notification texts and log lines.
//!
//! Notification copy is Spanish, as the product ships.

use campus_state::Notification;

pub fn signed_up() -> Notification {
    Notification::new("Cuenta creada", "Tu cuenta ha sido creada exitosamente")
}

pub fn signed_in() -> Notification {
    Notification::new("Bienvenido", "Has iniciado sesión correctamente")
}

pub fn signed_out() -> Notification {
    Notification::new("Sesión cerrada", "Has cerrado sesión correctamente")
}

pub fn reset_sent() -> Notification {
    Notification::new(
        "Correo enviado",
        "Revisa tu correo para restablecer tu contraseña",
    )
}

pub fn password_updated() -> Notification {
    Notification::new(
        "Contraseña actualizada",
        "Tu contraseña ha sido actualizada correctamente",
    )
}

// Log lines.
pub const LOG_SETUP_FAILED: &str = "Auth setup failed";
pub const LOG_SIGNED_IN: &str = "User signed in";
pub const LOG_SIGNED_OUT: &str = "User signed out";
pub const LOG_SIGN_UP_FAILED: &str = "Sign up failed";
pub const LOG_SIGN_IN_FAILED: &str = "Sign in failed";
pub const LOG_SIGN_OUT_OK: &str = "User signed out successfully";
pub const LOG_SIGN_OUT_FAILED: &str = "Sign out failed";
pub const LOG_RESET_SENT: &str = "Password reset email sent";
pub const LOG_RESET_FAILED: &str = "Password reset failed";
pub const LOG_PASSWORD_UPDATED: &str = "Password updated successfully";
pub const LOG_PASSWORD_UPDATE_FAILED: &str = "Password update failed";
