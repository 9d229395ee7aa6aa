use crate::checker::dictionary::DictionaryEngine;
use std::sync::Arc;

pub const TEST_AFF: &str = "SET UTF-8\nTRY esianrtolcdugmphbyfvkwzESIANRTOLCDUGMPHBYFVKWZ'\n";

pub const TEST_DIC: &str = "\
60
a
I
an
and
be
check
code
compute
example
file
first
for
hello
here
in
is
it
line
mail
misspelled
more
name
note
now
of
or
parse
retry
run
second
see
some
spelled
task
text
the
there
this
third
to
total
twice
use
user
value
with
word
words
world
your
documentation
describes
function
returns
greeting
message
inside
block
should
never
";

pub async fn test_engine() -> Arc<DictionaryEngine> {
    let engine = DictionaryEngine::builder()
        .with_inline("en_US", TEST_AFF, TEST_DIC)
        .build();
    engine.init().await.unwrap();
    Arc::new(engine)
}
