pub mod logout;
pub mod me;
pub mod userinfo;

pub use logout::post as logout_post;
pub use me::get as me_get;
pub use userinfo::get as userinfo_get;
