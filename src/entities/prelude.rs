pub use super::essays::Entity as Essays;
pub use super::payment_references::Entity as PaymentReferences;
pub use super::users::Entity as Users;
