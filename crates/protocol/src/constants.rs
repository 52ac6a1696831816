/// Starts a multipart session.
pub const INITIATE_PATH: &str = "/api/upload/initiate";

/// Receives one part as a raw request body.
pub const PART_PATH: &str = "/api/upload/part";

/// Assembles the uploaded parts into the final object.
pub const COMPLETE_PATH: &str = "/api/upload/complete";

/// Discards a session and any parts stored for it.
pub const ABORT_PATH: &str = "/api/upload/abort";

/// Header carrying the session id on part uploads.
pub const HEADER_UPLOAD_ID: &str = "X-Upload-Id";

/// Header carrying the destination key on part uploads.
pub const HEADER_KEY: &str = "X-Key";

/// Header carrying the 1-based part number on part uploads.
pub const HEADER_PART_NUMBER: &str = "X-Part-Number";
