//! Fixed schema of the backup databases.
//!
//! Table and column names are an external contract owned by iOS; they are
//! not renegotiable here. Constants per column keep the SQL assembly free
//! of string typos.

/// Message table schema (messages store)
pub mod message {
    /// Table name
    pub const TABLE: &str = "message";
    /// Primary key, used elsewhere as message_id
    pub const ROWID: &str = "ROWID";
    /// Message body, nullable
    pub const TEXT: &str = "text";
    /// Sender handle id
    pub const HANDLE_ID: &str = "handle_id";
    /// `SMS` or `iMessage`
    pub const SERVICE: &str = "service";
    /// Sent date, offset from the 2001 anchor
    pub const DATE: &str = "date";
    /// Read date, offset from the 2001 anchor; 0 if unknown
    pub const DATE_READ: &str = "date_read";
    /// 1 = sent by the device owner
    pub const IS_FROM_ME: &str = "is_from_me";
    /// 1 = the message was read
    pub const IS_READ: &str = "is_read";
}

/// Chat table schema (messages store)
pub mod chat {
    /// Table name
    pub const TABLE: &str = "chat";
    /// Primary key, used elsewhere as chat_id
    pub const ROWID: &str = "ROWID";
    /// String identifier shared across SMS and iMessage
    pub const CHAT_IDENTIFIER: &str = "chat_identifier";
}

/// Handle table schema (messages store)
pub mod handle {
    /// Table name
    pub const TABLE: &str = "handle";
    /// Primary key, used elsewhere as handle_id
    pub const ROWID: &str = "ROWID";
    /// Phone number or email
    pub const ID: &str = "id";
}

/// Chat/handle join table schema (messages store)
pub mod chat_handle_join {
    /// Table name
    pub const TABLE: &str = "chat_handle_join";
    /// Chat side of the join
    pub const CHAT_ID: &str = "chat_id";
    /// Handle side of the join
    pub const HANDLE_ID: &str = "handle_id";
}

/// Chat/message join table schema (messages store)
pub mod chat_message_join {
    /// Table name
    pub const TABLE: &str = "chat_message_join";
    /// Chat side of the join
    pub const CHAT_ID: &str = "chat_id";
    /// Message side of the join
    pub const MESSAGE_ID: &str = "message_id";
}

/// Attachment table schema (messages store)
pub mod attachment {
    /// Table name
    pub const TABLE: &str = "attachment";
    /// Primary key, used elsewhere as attachment_id
    pub const ROWID: &str = "ROWID";
    /// Full path of the file on the device filesystem
    pub const FILENAME: &str = "filename";
}

/// Message/attachment join table schema (messages store)
pub mod message_attachment_join {
    /// Table name
    pub const TABLE: &str = "message_attachment_join";
    /// Message side of the join
    pub const MESSAGE_ID: &str = "message_id";
    /// Attachment side of the join
    pub const ATTACHMENT_ID: &str = "attachment_id";
}

/// Address book multi-value table schema (contacts store)
pub mod ab_multi_value {
    /// Table name
    pub const TABLE: &str = "ABMultiValue";
    /// The phone number or email itself
    pub const VALUE: &str = "value";
    /// Foreign key to the person row
    pub const RECORD_ID: &str = "record_id";
    /// Value type discriminator
    pub const PROPERTY: &str = "property";
    /// Property code for phone numbers
    pub const PROPERTY_PHONE: i64 = 3;
    /// Property code for email addresses
    pub const PROPERTY_EMAIL: i64 = 4;
}

/// Address book person table schema (contacts store)
pub mod ab_person {
    /// Table name
    pub const TABLE: &str = "ABPerson";
    /// Primary key, joined from the multi-value table
    pub const ROWID: &str = "ROWID";
    /// First name, nullable
    pub const FIRST: &str = "first";
    /// Last name, nullable
    pub const LAST: &str = "last";
    /// Organization name, nullable
    pub const ORGANIZATION: &str = "organization";
}
