/*
 * Copyright (c) 2021. Aberic - All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * http://www.apache.org/licenses/LICENSE-2.0
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fmt;
use std::ops::Add;
use crate::utils::errors::{Errs, StarryResult};

#[derive(Clone, PartialEq, Eq)]
pub struct Status(u16, &'static str);

impl Status {
    /// 200 OK
    ///
    /// 参见[[RFC7231, Section 6.3.1](https://tools.ietf.org/html/rfc7231#section-6.3.1)]
    pub const OK: Status = Status(200, "OK");
    /// 400 Bad Request
    ///
    /// 参见[[RFC7231, Section 6.5.1](https://tools.ietf.org/html/rfc7231#section-6.5.1)]
    pub const BAD_REQUEST: Status = Status(400, "Bad Request");
    /// 404 Not Found
    ///
    /// 参见[[RFC7231, Section 6.5.4](https://tools.ietf.org/html/rfc7231#section-6.5.4)]
    pub const NOT_FOUND: Status = Status(404, "Not Found");
    /// 405 Method Not Allowed
    ///
    /// 参见[[RFC7231, Section 6.5.5](https://tools.ietf.org/html/rfc7231#section-6.5.5)]
    pub const METHOD_NOT_ALLOWED: Status = Status(405, "Method Not Allowed");
    /// 406 Not Acceptable
    ///
    /// 参见[[RFC7231, Section 6.5.6](https://tools.ietf.org/html/rfc7231#section-6.5.6)]
    pub const NOT_ACCEPTABLE: Status = Status(406, "Not Acceptable");
    /// 415 Unsupported Media Type
    ///
    /// 参见[[RFC7231, Section 6.5.13](https://tools.ietf.org/html/rfc7231#section-6.5.13)]
    pub const UNSUPPORTED_MEDIA_TYPE: Status = Status(415, "Unsupported Media Type");
    /// 417 Expectation Failed
    ///
    /// 参见[[RFC7231, Section 6.5.14](https://tools.ietf.org/html/rfc7231#section-6.5.14)]
    pub const EXPECTATION_FAILED: Status = Status(417, "Expectation Failed");
    /// 505 HTTP Version Not Supported
    ///
    /// 参见[[RFC7231, Section 6.6.6](https://tools.ietf.org/html/rfc7231#section-6.6.6)]
    pub const HTTP_VERSION_NOT_SUPPORTED: Status = Status(505, "HTTP Version Not Supported");

    pub fn from_code(code: u16) -> StarryResult<Status> {
        match code {
            200 => Ok(Status::OK),
            400 => Ok(Status::BAD_REQUEST),
            404 => Ok(Status::NOT_FOUND),
            405 => Ok(Status::METHOD_NOT_ALLOWED),
            406 => Ok(Status::NOT_ACCEPTABLE),
            415 => Ok(Status::UNSUPPORTED_MEDIA_TYPE),
            417 => Ok(Status::EXPECTATION_FAILED),
            505 => Ok(Status::HTTP_VERSION_NOT_SUPPORTED),
            _ => Err(Errs::string(format!("un support http status code {}!", code))),
        }
    }

    /// 用`&str`表示当前Status
    pub fn phrase(&self) -> &str {
        self.1
    }

    pub fn phrase_as_slice(&self) -> &[u8] {
        self.1.as_bytes()
    }

    pub fn code(&self) -> u16 {
        self.0
    }
}

impl<'a> PartialEq<&'a Status> for Status {
    fn eq(&self, other: &&'a Status) -> bool {
        self == *other
    }
}

impl<'a> PartialEq<Status> for &'a Status {
    fn eq(&self, other: &Status) -> bool {
        *self == other
    }
}

impl PartialEq<str> for Status {
    fn eq(&self, other: &str) -> bool {
        self.phrase() == other
    }
}

impl PartialEq<Status> for str {
    fn eq(&self, other: &Status) -> bool {
        self == other.phrase()
    }
}

impl<'a> PartialEq<&'a str> for Status {
    fn eq(&self, other: &&'a str) -> bool {
        self.phrase() == *other
    }
}

impl<'a> PartialEq<Status> for &'a str {
    fn eq(&self, other: &Status) -> bool {
        *self == other.phrase()
    }
}

impl<'a> PartialEq<u16> for Status {
    fn eq(&self, other: &u16) -> bool {
        self.0 == *other
    }
}

impl<'a> PartialEq<Status> for u16 {
    fn eq(&self, other: &Status) -> bool {
        *self == other.code()
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&*self.code().to_string().add(" ").to_string().add(self.phrase()))
    }
}

#[test]
fn status_to_str() {
    let s = Status::NOT_ACCEPTABLE;
    assert_eq!(s.code(), 406);
    assert_eq!(s.phrase(), "Not Acceptable");
}

#[test]
fn status_eq() {
    assert_eq!(Status::OK, Status::OK);
    assert_eq!(Status::OK, "OK");
    assert_eq!(&Status::OK, "OK");
    assert_eq!(Status::OK, 200);
    assert_eq!("OK", Status::OK);
    assert_eq!("OK", &Status::OK);
    assert_eq!(200, Status::OK);
}

#[test]
fn status_from() {
    assert!(Status::from_code(200).is_ok());
    assert!(Status::from_code(800).is_err());
    assert_eq!(Status::from_code(200).unwrap(), 200)
}
