use super::{Headers, Method, RtspRequest};

/// RTSP session bookkeeping (sans-IO)
///
/// Owns the `CSeq` counter, the session token handed out by SETUP and the
/// headers sent with every request.
#[derive(Debug, Clone)]
pub struct RtspSession {
    /// Request target for every request
    url: String,
    /// User agent string
    user_agent: String,
    /// `CSeq` counter, pre-incremented
    cseq: u32,
    /// Session token (from SETUP)
    session: Option<String>,
    /// Headers appended to every request
    extra_headers: Headers,
}

impl RtspSession {
    /// Create a new session targeting `url`
    #[must_use]
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: user_agent.into(),
            cseq: 0,
            session: None,
            extra_headers: Headers::new(),
        }
    }

    /// Request target
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `CSeq` of the most recent request (0 before the first)
    #[must_use]
    pub fn cseq(&self) -> u32 {
        self.cseq
    }

    /// Session token, once SETUP has succeeded
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Store the session token returned by SETUP
    pub fn set_session(&mut self, token: impl Into<String>) {
        self.session = Some(token.into());
    }

    /// Headers sent with every request
    #[must_use]
    pub fn extra_headers(&self) -> &Headers {
        &self.extra_headers
    }

    /// Mutable access to the always-sent headers
    pub fn extra_headers_mut(&mut self) -> &mut Headers {
        &mut self.extra_headers
    }

    fn next_cseq(&mut self) -> u32 {
        self.cseq = self.cseq.wrapping_add(1);
        self.cseq
    }

    /// Build the next request
    ///
    /// Header order on the wire: `CSeq`, `Session` (if known), `headers`,
    /// `Content-Type`/`Content-Length` (only when both `content_type` and
    /// `content` are given), `User-Agent`, then the always-sent headers.
    ///
    /// Names are matched case-insensitively and a later header replaces an
    /// earlier one in place rather than being appended. A caller `CSeq` or
    /// `Session` therefore overrides the generated value, while a caller
    /// `User-Agent` is itself overridden by the session's.
    pub fn build_request(
        &mut self,
        method: Method,
        content_type: Option<&str>,
        content: Option<&[u8]>,
        headers: Option<&Headers>,
    ) -> RtspRequest {
        let mut builder = RtspRequest::builder(method, self.url.clone()).cseq(self.next_cseq());

        if let Some(ref session) = self.session {
            builder = builder.session(session);
        }
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }
        if let (Some(content_type), Some(content)) = (content_type, content) {
            builder = builder.body(content_type, content.to_vec());
        }

        builder
            .user_agent(&self.user_agent)
            .headers(&self.extra_headers)
            .build()
    }
}
