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
use std::fmt::{Display, Formatter};

use crate::utils::errors::{Errs, StarryResult};
use crate::http::method::Inner::*;

/// Method names one of the four request methods this library's request
/// parser and demultiplexer recognize.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Method(Inner);

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Inner {
    /// HTTP/1.0 定义，参考[RFC 1945](https://datatracker.ietf.org/doc/html/rfc1945#section-8.1)
    ///
    /// GET方法意味着检索由Request-URI标识的任何信息(以实体的形式)。
    Get,
    /// HTTP/1.0 定义，参考[RFC 1945](https://datatracker.ietf.org/doc/html/rfc1945#section-8.3)
    ///
    /// POST方法用于请求源服务器接受请求中包含的实体，作为该资源的一个新的从属实体。
    Post,
    /// 参考[RFC 2616](https://datatracker.ietf.org/doc/html/rfc2616#section-9.6)
    ///
    /// PUT方法请求将所包含的实体存储在所提供的Request-URI下。
    Put,
    /// 参考[RFC 2616](https://datatracker.ietf.org/doc/html/rfc2616#section-9.7)
    ///
    /// DELETE方法请求源服务器删除Request-URI标识的资源。
    Delete,
}

impl Method {
    /// GET 参考[`Inner::Get`]
    pub const GET: Method = Method(Get);

    /// POST 参考[`Inner::Post`]
    pub const POST: Method = Method(Post);

    /// PUT 参考[`Inner::Put`]
    pub const PUT: Method = Method(Put);

    /// DELETE 参考[`Inner::Delete`]
    pub const DELETE: Method = Method(Delete);

    /// Exact, case-sensitive match of a request-line method token.
    pub fn from_bytes(src: &[u8]) -> StarryResult<Method> {
        match src {
            b"GET" => Ok(Method(Get)),
            b"PUT" => Ok(Method(Put)),
            b"POST" => Ok(Method(Post)),
            b"DELETE" => Ok(Method(Delete)),
            _ => Err(Errs::string(format!("invalid method {}!", String::from_utf8_lossy(src)))),
        }
    }

    pub fn from_str(t: &str) -> StarryResult<Method> {
        Method::from_bytes(t.as_bytes())
    }

    /// 用`&str`表示当前HTTP的方法
    pub fn as_str(&self) -> &str {
        match self.0 {
            Get => "GET",
            Post => "POST",
            Put => "PUT",
            Delete => "DELETE",
        }
    }

    /// GET is safe; PUT, DELETE and POST are not.
    pub fn is_safe(&self) -> bool {
        matches!(self.0, Get)
    }

    /// PUT and DELETE are idempotent; POST is not, and neither is GET by
    /// this library's narrower definition (GET carries no side effects to
    /// begin with, so idempotency is moot for it).
    pub fn is_idempotent(&self) -> bool {
        matches!(self.0, Put | Delete)
    }

    /// GET and POST are cacheable (POST only when the response carries
    /// explicit freshness information, which this library does not itself
    /// enforce).
    pub fn is_cacheable(&self) -> bool {
        matches!(self.0, Get | Post)
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<'a> PartialEq<&'a Method> for Method {
    fn eq(&self, other: &&'a Method) -> bool {
        self == *other
    }
}

impl<'a> PartialEq<Method> for &'a Method {
    fn eq(&self, other: &Method) -> bool {
        *self == other
    }
}

impl PartialEq<str> for Method {
    fn eq(&self, other: &str) -> bool {
        self.as_ref() == other
    }
}

impl PartialEq<Method> for str {
    fn eq(&self, other: &Method) -> bool {
        self == other.as_ref()
    }
}

impl<'a> PartialEq<&'a str> for Method {
    fn eq(&self, other: &&'a str) -> bool {
        self.as_ref() == *other
    }
}

impl<'a> PartialEq<Method> for &'a str {
    fn eq(&self, other: &Method) -> bool {
        *self == other.as_ref()
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod method_test {
    use crate::http::method::Method;

    #[test]
    fn method_eq() {
        assert_eq!(Method::GET, Method::GET);
        assert_eq!(Method::GET, "GET");
        assert_eq!(&Method::GET, "GET");

        assert_eq!("GET", Method::GET);
        assert_eq!("GET", &Method::GET);

        assert_eq!(&Method::GET, Method::GET);
        assert_eq!(Method::GET, &Method::GET);
    }

    #[test]
    fn invalid_method() {
        assert!(Method::from_str("GET").is_ok());
        assert!(Method::from_bytes(b"DELETE").is_ok());
        assert!(Method::from_str("").is_err());
        assert!(Method::from_str("omg").is_err());
        assert!(Method::from_bytes(b"HEAD").is_err());
        assert!(Method::from_bytes(&[0xC0]).is_err());
    }

    #[test]
    fn is_safe() {
        assert!(Method::GET.is_safe());
        assert!(!Method::PUT.is_safe());
        assert!(!Method::DELETE.is_safe());
        assert!(!Method::POST.is_safe());
    }

    #[test]
    fn is_idempotent() {
        assert!(Method::PUT.is_idempotent());
        assert!(Method::DELETE.is_idempotent());
        assert!(!Method::GET.is_idempotent());
        assert!(!Method::POST.is_idempotent());
    }

    #[test]
    fn is_cacheable() {
        assert!(Method::GET.is_cacheable());
        assert!(Method::POST.is_cacheable());
        assert!(!Method::PUT.is_cacheable());
        assert!(!Method::DELETE.is_cacheable());
    }
}
