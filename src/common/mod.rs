pub use self::digits::iterate_digits_lsd;
pub use self::name::Name;
pub use self::states::{StateId, StateSet};

mod states;
mod name;
mod digits;
