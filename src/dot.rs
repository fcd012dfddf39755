use std::fmt::{Display, Write};

use crate::{augment::Augment, node::Node};

/// Render the subtree rooted at `n` in Graphviz dot format, labelling each
/// node with its key and color.
#[allow(unused)]
pub(crate) fn print_dot<K, V, A>(n: &Node<K, V, A>) -> String
where
    K: Display,
    A: Augment<K, V>,
{
    let mut buf = String::new();

    writeln!(buf, "digraph {{");
    writeln!(buf, "node [shape=record];");
    recurse(n, &mut buf);
    writeln!(buf, "}}");

    buf
}

#[allow(unused)]
fn recurse<K, V, A, W>(n: &Node<K, V, A>, buf: &mut W)
where
    W: std::fmt::Write,
    K: Display,
    A: Augment<K, V>,
{
    writeln!(
        buf,
        r#""{}" [label="{} | {:?}"];"#,
        n.key(),
        n.key(),
        n.color()
    )
    .unwrap();

    for v in [n.left(), n.right()] {
        match v {
            Some(v) => {
                writeln!(buf, r#""{}" -> "{}";"#, n.key(), v.key()).unwrap();
                recurse(v, buf);
            }
            None => {
                writeln!(buf, r#""null_{}" [shape=point,style=invis];"#, n.key()).unwrap();
                writeln!(buf, r#""{}" -> "null_{}" [style=invis];"#, n.key(), n.key()).unwrap();
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::RbTree;

    #[test]
    fn test_simple() {
        let mut t: RbTree<i64, usize> = RbTree::default();

        t.insert(2, 0);
        t.insert(1, 0);
        t.insert(3, 0);

        let dot = print_dot(t.root().unwrap());

        assert_eq!(
            dot,
            "digraph {\n\
             node [shape=record];\n\
             \"2\" [label=\"2 | Black\"];\n\
             \"2\" -> \"1\";\n\
             \"1\" [label=\"1 | Red\"];\n\
             \"null_1\" [shape=point,style=invis];\n\
             \"1\" -> \"null_1\" [style=invis];\n\
             \"null_1\" [shape=point,style=invis];\n\
             \"1\" -> \"null_1\" [style=invis];\n\
             \"2\" -> \"3\";\n\
             \"3\" [label=\"3 | Red\"];\n\
             \"null_3\" [shape=point,style=invis];\n\
             \"3\" -> \"null_3\" [style=invis];\n\
             \"null_3\" [shape=point,style=invis];\n\
             \"3\" -> \"null_3\" [style=invis];\n\
             }\n"
        );
    }
}
