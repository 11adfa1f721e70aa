/*
 * Copyright (c) 2021 gematik GmbH
 * 
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * 
 *    http://www.apache.org/licenses/LICENSE-2.0
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

use std::borrow::Cow;

use xmlsec::Element;

use super::{ds, xades, C14N};

/// Values that can be embedded into a signature as unsigned property.
pub trait ToBuffer {
    fn to_buffer(&self) -> Cow<'_, [u8]>;
}

impl ToBuffer for [u8] {
    fn to_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl ToBuffer for Vec<u8> {
    fn to_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

/// `UnsignedProperties` holding the signature time stamp and the OCSP
/// response, in this order.
pub(super) fn unsigned_properties(timestamp: Option<&[u8]>, ocsp_response: Option<&[u8]>) -> Element {
    let mut properties = Element::new(&xades(), "UnsignedSignatureProperties");

    if let Some(timestamp) = timestamp {
        properties.push(
            Element::new(&xades(), "SignatureTimeStamp")
                .attr("Id", "S0-T0")
                .child(Element::new(&ds(), "CanonicalizationMethod").attr("Algorithm", C14N.uri()))
                .child(
                    Element::new(&xades(), "EncapsulatedTimeStamp").text(base64::encode(timestamp)),
                ),
        );
    }

    if let Some(ocsp_response) = ocsp_response {
        properties.push(
            Element::new(&xades(), "RevocationValues").child(
                Element::new(&xades(), "OCSPValues").child(
                    Element::new(&xades(), "EncapsulatedOCSPValue")
                        .text(base64::encode(ocsp_response)),
                ),
            ),
        );
    }

    Element::new(&xades(), "UnsignedProperties").child(properties)
}
