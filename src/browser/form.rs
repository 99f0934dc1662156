use crate::browser::Browser;
use crate::document::Element;
use crate::errors::{Error, Result};
use reqwest::Method;
use url::Url;

/// A form on a page, bound to the browser that loaded it.
///
/// Field values start from the markup and can be changed before submitting.
#[derive(Debug, Clone)]
pub struct Form {
    browser: Browser,
    page: Url,
    method: Method,
    action: Url,
    fields: Vec<(String, String)>,
    buttons: Vec<(String, String)>,
    markup: String,
}

impl Form {
    pub(crate) fn from_element(browser: Browser, element: &Element, page: &Url) -> Result<Self> {
        let method = match element.attr("method") {
            Some(m) if m.trim().eq_ignore_ascii_case("post") => Method::POST,
            _ => Method::GET,
        };
        let action = match element.attr("action").map(str::trim) {
            Some(action) if !action.is_empty() => page
                .join(action)
                .map_err(|e| Error::malformed(action, e))?,
            _ => page.clone(),
        };

        let mut fields = Vec::new();
        let mut buttons = Vec::new();
        for control in element.find("input[name], textarea[name], select[name], button[name]")? {
            if control.has_attr("disabled") {
                continue;
            }
            let Some(name) = control.attr("name").map(str::to_string) else {
                continue;
            };
            match control.name() {
                "input" => {
                    let kind = control.attr("type").unwrap_or("text").to_ascii_lowercase();
                    let value = control.attr("value");
                    match kind.as_str() {
                        "submit" | "image" => {
                            buttons.push((name, value.unwrap_or_default().to_string()))
                        }
                        "button" | "reset" | "file" => {}
                        "checkbox" | "radio" => {
                            if control.has_attr("checked") {
                                fields.push((name, value.unwrap_or("on").to_string()));
                            }
                        }
                        _ => fields.push((name, value.unwrap_or_default().to_string())),
                    }
                }
                "textarea" => fields.push((name, control.text().to_string())),
                "select" => {
                    if let Some(value) = selected_option(&control)? {
                        fields.push((name, value));
                    }
                }
                "button" => {
                    let kind = control.attr("type").unwrap_or("submit");
                    if kind.eq_ignore_ascii_case("submit") {
                        buttons.push((name, control.attr("value").unwrap_or_default().to_string()));
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            browser,
            page: page.clone(),
            method,
            action,
            fields,
            buttons,
            markup: element.html().to_string(),
        })
    }

    /// GET or POST, from the method attribute.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL the form submits to.
    pub fn action(&self) -> &Url {
        &self.action
    }

    /// Field values in document order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Named submit buttons and their values.
    pub fn buttons(&self) -> &[(String, String)] {
        &self.buttons
    }

    /// Value of the first field called `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Markup of the form element.
    pub fn html(&self) -> &str {
        &self.markup
    }

    /// Changes the value of an existing field.
    pub fn input(&mut self, name: &str, value: &str) -> Result<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::not_found(name, "no form field with that name"))?;
        field.1 = value.to_string();
        Ok(())
    }

    /// Submits the form without pressing a button.
    pub async fn submit(&self) -> Result<()> {
        self.send(&self.fields).await
    }

    /// Submits the form as if the named button was pressed.
    pub async fn click(&self, button: &str) -> Result<()> {
        let pressed = self
            .buttons
            .iter()
            .find(|(n, _)| n == button)
            .ok_or_else(|| Error::not_found(button, "no submit button with that name"))?;
        let mut values = self.fields.clone();
        values.push(pressed.clone());
        self.send(&values).await
    }

    async fn send(&self, values: &[(String, String)]) -> Result<()> {
        ::log::debug!("Submitting {} {} with {} values", self.method, self.action, values.len());
        self.browser
            .submit_form(&self.method, &self.action, values, &self.page)
            .await
    }
}

/// The selected option of a select element, else its first option.
///
/// Disabled options are never chosen.
fn selected_option(select: &Element) -> Result<Option<String>> {
    let options = select.find("option:not([disabled])")?;
    let chosen = options
        .iter()
        .find(|option| option.has_attr("selected"))
        .or_else(|| options.first());
    Ok(chosen.map(|option| {
        option
            .attr("value")
            .map(str::to_string)
            .unwrap_or_else(|| option.text().trim().to_string())
    }))
}
