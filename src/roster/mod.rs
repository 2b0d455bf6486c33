pub mod reconcile;
pub mod types;

pub use reconcile::{
    find_lost_students, find_lost_tests, review_lost_students, LostStudent, LostTest,
};
pub use types::{load_roster, load_schools, RegistrationRecord, Roster, School, SchoolDirectory};
