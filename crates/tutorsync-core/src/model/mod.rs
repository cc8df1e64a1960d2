pub mod checks;
pub mod matches;
pub mod meeting;
pub mod org;
pub mod person;
pub mod tags;
pub mod timeslot;
pub mod user;

pub use matches::Match;
pub use meeting::{Meeting, MeetingStatus, Venue};
pub use org::Org;
pub use person::{Person, Role};
pub use tags::{MatchTag, MeetingTag, UserTag};
pub use timeslot::Timeslot;
pub use user::{Subjects, User, Verification};
