pub mod assessment;
pub mod attempt;
pub mod question;
pub mod user;
pub mod violation;
