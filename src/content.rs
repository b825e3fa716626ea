//! Caller-supplied content: a ready node, or a function of the props the
//! component would otherwise render with.

use maud::Markup;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Content<P> {
    Node(Markup),
    Render(Rc<dyn Fn(&P) -> Markup>),
}

impl<P> Content<P> {
    pub fn render_fn(f: impl Fn(&P) -> Markup + 'static) -> Self {
        Content::Render(Rc::new(f))
    }

    pub fn render(&self, props: &P) -> Markup {
        match self {
            Content::Node(markup) => markup.clone(),
            Content::Render(f) => f(props),
        }
    }
}

impl<P> From<Markup> for Content<P> {
    fn from(markup: Markup) -> Self {
        Content::Node(markup)
    }
}

impl<P> fmt::Debug for Content<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Node(markup) => f.debug_tuple("Node").field(&markup.0).finish(),
            Content::Render(_) => f.write_str("Render(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maud::html;

    #[test]
    fn node_ignores_props() {
        let content: Content<u32> = html! { b { "fixed" } }.into();
        assert_eq!(content.render(&7).into_string(), "<b>fixed</b>");
    }

    #[test]
    fn render_fn_receives_props() {
        let content = Content::render_fn(|n: &u32| html! { i { (n) } });
        assert_eq!(content.render(&7).into_string(), "<i>7</i>");
    }
}
