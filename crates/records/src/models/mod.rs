mod author;
mod availability;
mod edition;
mod identifier;
mod keys;
mod kind;
mod signals;
mod work;

pub use self::author::Author;
pub use self::availability::Availability;
pub use self::edition::{Edition, EditionSource};
pub use self::identifier::{Identifier, IdentifierKind};
pub use self::keys::{AuthorKey, CoverId, EditionKey, WorkKey};
pub use self::kind::RecordKind;
pub use self::signals::{RatingAggregate, SignalSources};
pub use self::work::Work;

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase().replace(['/', '-', '_', ' '], "")
}
