mod handler;
mod model;

pub use handler::{
    login,
    login_page,
    logout,
    profile,
    register,
    register_page,
    verify_otp,
    verify_otp_page,
};
pub use model::{Account, AccountError, NewAccount};
