mod club;
mod comment;
mod event;
mod friend_request;
mod lost_found;
mod marketplace;
mod message;
mod notification;
mod placement;
mod post;
mod study_material;
mod user_profile;

pub use club::Club;
pub use comment::Comment;
pub use event::{Event, NewEvent};
pub use friend_request::{FriendRequest, FriendRequestStatus};
pub use lost_found::{LostFoundItem, LostFoundType, NewLostFoundItem};
pub use marketplace::{ItemCondition, MarketplaceItem, NewMarketplaceItem};
pub use message::{club_channel, direct_channel, Message};
pub use notification::{Notification, NotificationType};
pub use placement::{NewPlacement, Placement};
pub use post::{NewPost, Post, PostCategory};
pub use study_material::{NewStudyMaterial, StudyMaterial};
pub use user_profile::{ProfileUpdate, UserProfile};
